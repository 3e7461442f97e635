use fieldcrew_core::AppError;
use fieldcrew_domain::{AuditAction, BuiltInRole, RoleReference};
use serde_json::json;

use crate::BOOTSTRAP_ACTOR;
use crate::test_support::Harness;

#[tokio::test]
async fn manager_moves_estimator_to_field_tech() {
    let harness = Harness::new();
    let manager = harness.member("manager", BuiltInRole::Manager).await;
    harness.member("estimator", BuiltInRole::Estimator).await;

    let assignment = harness
        .team
        .assign_role(&manager, "estimator", BuiltInRole::FieldTech.into())
        .await
        .unwrap_or_else(|_| panic!("assign"));

    assert_eq!(assignment.role, BuiltInRole::FieldTech.into());
    let events = harness.audit.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::RoleAssigned);
    assert_eq!(
        events[0].before,
        Some(json!({ "subject": "estimator", "role": "estimator" }))
    );
    assert_eq!(
        events[0].after,
        Some(json!({ "subject": "estimator", "role": "field_tech" }))
    );
}

#[tokio::test]
async fn manager_cannot_promote_to_own_level() {
    let harness = Harness::new();
    let manager = harness.member("manager", BuiltInRole::Manager).await;
    harness.member("estimator", BuiltInRole::Estimator).await;

    let result = harness
        .team
        .assign_role(&manager, "estimator", BuiltInRole::Manager.into())
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(
        harness.store.assignment(harness.tenant_id, "estimator").await,
        Some(BuiltInRole::Estimator.into())
    );
}

#[tokio::test]
async fn manager_cannot_demote_a_superior() {
    let harness = Harness::new();
    let manager = harness.member("manager", BuiltInRole::Manager).await;
    harness.member("admin", BuiltInRole::Admin).await;

    let result = harness
        .team
        .assign_role(&manager, "admin", BuiltInRole::Viewer.into())
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn promotion_between_check_and_write_is_a_conflict() {
    let harness = Harness::new();
    let manager = harness.member("manager", BuiltInRole::Manager).await;
    harness.member("target", BuiltInRole::Estimator).await;
    harness
        .store
        .change_after_next_read(harness.tenant_id, "target", BuiltInRole::Admin.into())
        .await;

    let result = harness
        .team
        .assign_role(&manager, "target", BuiltInRole::FieldTech.into())
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(
        harness.store.assignment(harness.tenant_id, "target").await,
        Some(BuiltInRole::Admin.into())
    );
    assert!(harness.audit.events.lock().await.is_empty());
}

#[tokio::test]
async fn own_role_cannot_be_changed() {
    let harness = Harness::new();
    let owner = harness.member("owner", BuiltInRole::Owner).await;

    let result = harness
        .team
        .assign_role(&owner, "owner", BuiltInRole::Viewer.into())
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn non_members_cannot_be_assigned() {
    let harness = Harness::new();
    let owner = harness.member("owner", BuiltInRole::Owner).await;

    let result = harness
        .team
        .assign_role(&owner, "stranger", BuiltInRole::Viewer.into())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn unknown_custom_role_target_is_not_found() {
    let harness = Harness::new();
    let owner = harness.member("owner", BuiltInRole::Owner).await;
    harness.member("viewer", BuiltInRole::Viewer).await;

    let result = harness
        .team
        .assign_role(
            &owner,
            "viewer",
            RoleReference::Custom(fieldcrew_domain::CustomRoleId::new()),
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn bootstrap_only_claims_empty_tenants() {
    let harness = Harness::new();

    let first = harness.team.bootstrap_owner(harness.tenant_id, "founder").await;
    let second = harness.team.bootstrap_owner(harness.tenant_id, "latecomer").await;

    assert!(matches!(first, Ok(true)));
    assert!(matches!(second, Ok(false)));
    assert_eq!(
        harness.store.assignment(harness.tenant_id, "founder").await,
        Some(BuiltInRole::Owner.into())
    );
    assert_eq!(harness.store.assignment(harness.tenant_id, "latecomer").await, None);

    let events = harness.audit.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].actor, BOOTSTRAP_ACTOR);
}

#[tokio::test]
async fn listing_requires_manage_users() {
    let harness = Harness::new();
    let tech = harness.member("tech", BuiltInRole::FieldTech).await;
    let manager = harness.member("manager", BuiltInRole::Manager).await;

    assert!(harness.team.list_assignments(&tech).await.is_err());
    let listed = harness.team.list_assignments(&manager).await.unwrap_or_default();
    assert_eq!(listed.len(), 2);
}
