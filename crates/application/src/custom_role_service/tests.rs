use fieldcrew_core::AppError;
use fieldcrew_domain::{AuditAction, BuiltInRole, Capability, CustomRole, PermissionSet, RoleReference};

use crate::test_support::Harness;
use crate::{CreateCustomRoleInput, UpdateCustomRolePermissionsInput};

fn input(name: &str, level: u8) -> CreateCustomRoleInput {
    CreateCustomRoleInput {
        name: name.to_owned(),
        level,
        permissions: PermissionSet::from_granted([Capability::CanManageUsers]),
    }
}

async fn create(harness: &Harness, name: &str, level: u8) -> CustomRole {
    let owner = harness.member("owner", BuiltInRole::Owner).await;
    harness
        .roles
        .create_role(&owner, input(name, level))
        .await
        .unwrap_or_else(|_| panic!("create {name}"))
}

#[tokio::test]
async fn owner_creates_role_and_audits() {
    let harness = Harness::new();
    let role = create(&harness, "Regional Lead", 3).await;

    assert!(role.is_active());
    assert_eq!(role.version(), 1);
    assert!(role.permissions().allows(Capability::CanManageUsers));
    assert!(!role.permissions().allows(Capability::CanViewFinancials));
    assert_eq!(harness.audit_actions().await, vec![AuditAction::RoleCreated]);

    let events = harness.audit.events.lock().await;
    assert!(events[0].before.is_none());
    assert!(events[0].after.is_some());
}

#[tokio::test]
async fn duplicate_names_collide_ignoring_case() {
    let harness = Harness::new();
    create(&harness, "Regional Lead", 3).await;
    let owner = harness.context("owner").await;

    let result = harness
        .roles
        .create_role(&owner, input("  regional LEAD ", 2))
        .await;
    assert!(matches!(result, Err(AppError::DuplicateName(_))));
}

#[tokio::test]
async fn level_must_stay_below_owner() {
    let harness = Harness::new();
    let owner = harness.member("owner", BuiltInRole::Owner).await;
    let result = harness.roles.create_role(&owner, input("Shadow Owner", 5)).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn manage_roles_capability_is_required() {
    let harness = Harness::new();
    let manager = harness.member("manager", BuiltInRole::Manager).await;
    let result = harness.roles.create_role(&manager, input("Crew Lead", 1)).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn compliance_officer_overrides_levels() {
    let harness = Harness::new();
    let compliance = harness
        .member("compliance", BuiltInRole::ComplianceOfficer)
        .await;

    let result = harness
        .roles
        .create_role(&compliance, input("Senior Auditor", 4))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn stale_version_conflicts_without_changes() {
    let harness = Harness::new();
    let role = create(&harness, "Regional Lead", 3).await;
    let owner = harness.context("owner").await;

    let first = harness
        .roles
        .update_role_permissions(
            &owner,
            role.id(),
            UpdateCustomRolePermissionsInput {
                permissions: PermissionSet::from_granted([Capability::CanViewQuotes]),
                expected_version: Some(1),
            },
        )
        .await
        .unwrap_or_else(|_| panic!("update"));
    assert_eq!(first.version(), 2);

    let stale = harness
        .roles
        .update_role_permissions(
            &owner,
            role.id(),
            UpdateCustomRolePermissionsInput {
                permissions: PermissionSet::from_granted([Capability::CanViewFinancials]),
                expected_version: Some(1),
            },
        )
        .await;
    assert!(matches!(stale, Err(AppError::Conflict(_))));

    let current = harness
        .roles
        .find_role(&owner, role.id())
        .await
        .unwrap_or_else(|_| panic!("find"));
    assert!(current.permissions().allows(Capability::CanViewQuotes));
    assert!(!current.permissions().allows(Capability::CanViewFinancials));
}

#[tokio::test]
async fn update_replaces_the_full_set() {
    let harness = Harness::new();
    let role = create(&harness, "Regional Lead", 3).await;
    let owner = harness.context("owner").await;

    let updated = harness
        .roles
        .update_role_permissions(
            &owner,
            role.id(),
            UpdateCustomRolePermissionsInput {
                permissions: PermissionSet::from_granted([Capability::CanViewProjects]),
                expected_version: None,
            },
        )
        .await
        .unwrap_or_else(|_| panic!("update"));

    assert!(!updated.permissions().allows(Capability::CanManageUsers));
    assert!(updated.permissions().allows(Capability::CanViewProjects));
}

#[tokio::test]
async fn deactivation_with_holders_needs_reassignment() {
    let harness = Harness::new();
    let role = create(&harness, "Regional Lead", 3).await;
    let owner = harness.context("owner").await;
    for subject in ["a", "b", "c"] {
        harness
            .store
            .seed_assignment(harness.tenant_id, subject, RoleReference::Custom(role.id()))
            .await;
    }

    let refused = harness.roles.deactivate_role(&owner, role.id(), None).await;
    assert!(matches!(
        refused,
        Err(AppError::DanglingAssignment { holders: 3, .. })
    ));

    let deactivation = harness
        .roles
        .deactivate_role(&owner, role.id(), Some(BuiltInRole::Estimator.into()))
        .await
        .unwrap_or_else(|_| panic!("deactivate"));
    assert!(!deactivation.role.is_active());
    assert_eq!(deactivation.reassigned_subjects.len(), 3);

    for subject in ["a", "b", "c"] {
        let allowed = harness
            .guard
            .resolver()
            .has_capability(harness.tenant_id, subject, Capability::CanCreateQuotes)
            .await;
        assert!(matches!(allowed, Ok(true)));
    }
}

#[tokio::test]
async fn deactivation_cannot_target_itself_or_inactive_roles() {
    let harness = Harness::new();
    let role = create(&harness, "Regional Lead", 3).await;
    let other = create(&harness, "Night Shift", 1).await;
    let owner = harness.context("owner").await;

    let itself = harness
        .roles
        .deactivate_role(&owner, role.id(), Some(RoleReference::Custom(role.id())))
        .await;
    assert!(matches!(itself, Err(AppError::Validation(_))));

    harness
        .roles
        .deactivate_role(&owner, other.id(), None)
        .await
        .unwrap_or_else(|_| panic!("deactivate"));
    let inactive_target = harness
        .roles
        .deactivate_role(&owner, role.id(), Some(RoleReference::Custom(other.id())))
        .await;
    assert!(matches!(inactive_target, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn inactive_roles_reject_permission_updates() {
    let harness = Harness::new();
    let role = create(&harness, "Regional Lead", 3).await;
    let owner = harness.context("owner").await;
    harness
        .roles
        .deactivate_role(&owner, role.id(), None)
        .await
        .unwrap_or_else(|_| panic!("deactivate"));

    let result = harness
        .roles
        .update_role_permissions(
            &owner,
            role.id(),
            UpdateCustomRolePermissionsInput {
                permissions: PermissionSet::empty(),
                expected_version: None,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn roles_of_other_tenants_are_not_found() {
    let harness = Harness::new();
    let other = Harness::new();
    let role = create(&harness, "Regional Lead", 3).await;
    let foreign_owner = other.member("owner", BuiltInRole::Owner).await;

    let result = harness.roles.find_role(&foreign_owner, role.id()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn listing_reports_holders_per_role() {
    let harness = Harness::new();
    let lead = create(&harness, "Regional Lead", 3).await;
    let auditor = create(&harness, "Site Auditor", 1).await;
    for subject in ["lead-a", "lead-b"] {
        harness
            .store
            .seed_assignment(harness.tenant_id, subject, RoleReference::Custom(lead.id()))
            .await;
    }
    let inviter = harness.member("inviter", BuiltInRole::Manager).await;

    let listings = harness
        .roles
        .list_roles(&inviter)
        .await
        .unwrap_or_else(|_| panic!("list"));

    let holders = listings
        .iter()
        .map(|listing| (listing.role.id(), listing.holders))
        .collect::<Vec<_>>();
    assert_eq!(holders, vec![(lead.id(), 2), (auditor.id(), 0)]);
}
