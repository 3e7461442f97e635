use chrono::{Duration, Utc};
use fieldcrew_application::{CustomRoleRepository, InvitationRepository, RoleAssignmentRepository};
use fieldcrew_core::{AppError, TenantId};
use fieldcrew_domain::{
    BuiltInRole, Capability, CustomRole, EmailAddress, Invitation, InvitationStatus,
    PermissionSet, RoleLevel, RoleReference,
};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresAccessControlRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres access control tests: {error}");
    }

    Some(pool)
}

fn custom_role(tenant_id: TenantId, name: &str) -> CustomRole {
    CustomRole::new(
        tenant_id,
        name,
        RoleLevel::new(3),
        PermissionSet::from_granted([Capability::CanManageUsers]),
        Utc::now(),
    )
    .unwrap_or_else(|_| panic!("role"))
}

#[tokio::test]
async fn role_names_are_unique_ignoring_case() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessControlRepository::new(pool);
    let tenant_id = TenantId::new();

    let created = repository
        .create_role(custom_role(tenant_id, "Regional Lead"))
        .await;
    assert!(created.is_ok());

    let duplicate = repository
        .create_role(custom_role(tenant_id, "regional lead"))
        .await;
    assert!(matches!(duplicate, Err(AppError::DuplicateName(_))));

    let other_tenant = repository
        .create_role(custom_role(TenantId::new(), "Regional Lead"))
        .await;
    assert!(other_tenant.is_ok());
}

#[tokio::test]
async fn stale_version_update_is_rejected() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessControlRepository::new(pool);
    let tenant_id = TenantId::new();
    let role = repository
        .create_role(custom_role(tenant_id, "Estimating Lead"))
        .await
        .unwrap_or_else(|_| panic!("create"));

    let first = repository
        .replace_permissions(
            tenant_id,
            role.id(),
            PermissionSet::from_granted([Capability::CanViewQuotes]),
            Some(1),
            Utc::now(),
        )
        .await;
    assert!(matches!(first, Ok(ref updated) if updated.version() == 2));

    let stale = repository
        .replace_permissions(
            tenant_id,
            role.id(),
            PermissionSet::empty(),
            Some(1),
            Utc::now(),
        )
        .await;
    assert!(matches!(stale, Err(AppError::Conflict(_))));

    let stored = repository
        .find_role(tenant_id, role.id())
        .await
        .unwrap_or_default()
        .map(|role| role.permissions().allows(Capability::CanViewQuotes));
    assert_eq!(stored, Some(true));
}

#[tokio::test]
async fn deactivation_reassigns_holders_atomically() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessControlRepository::new(pool);
    let tenant_id = TenantId::new();
    let role = repository
        .create_role(custom_role(tenant_id, "Crew Chief"))
        .await
        .unwrap_or_else(|_| panic!("create"));

    assert!(
        repository
            .assign_if_tenant_empty(tenant_id, "owner", BuiltInRole::Owner.into())
            .await
            .unwrap_or_default()
    );
    for subject in ["a", "b", "c"] {
        let invitation = issue(tenant_id, RoleReference::Custom(role.id()), subject);
        assert!(repository.create_invitation(invitation.clone()).await.is_ok());
        assert!(
            repository
                .accept_invitation(tenant_id, invitation.token_hash(), subject, Utc::now())
                .await
                .is_ok()
        );
    }

    let refused = repository
        .deactivate_role(tenant_id, role.id(), None, Utc::now())
        .await;
    assert!(matches!(
        refused,
        Err(AppError::DanglingAssignment { holders: 3, .. })
    ));

    let deactivation = repository
        .deactivate_role(
            tenant_id,
            role.id(),
            Some(BuiltInRole::Estimator.into()),
            Utc::now(),
        )
        .await
        .unwrap_or_else(|_| panic!("deactivate"));
    assert_eq!(deactivation.reassigned_subjects, vec!["a", "b", "c"]);
    assert!(!deactivation.role.is_active());

    let holders = repository
        .count_holders(tenant_id, BuiltInRole::Estimator.into())
        .await;
    assert!(matches!(holders, Ok(3)));
}

fn issue(tenant_id: TenantId, role: RoleReference, nonce: &str) -> Invitation {
    Invitation::issue(
        tenant_id,
        EmailAddress::new(format!("{nonce}@example.com")).unwrap_or_else(|_| panic!("email")),
        role,
        format!("{}-{nonce}", uuid::Uuid::new_v4()),
        "owner",
        Utc::now(),
        Duration::hours(1),
    )
    .unwrap_or_else(|_| panic!("issue"))
}

#[tokio::test]
async fn concurrent_acceptance_has_one_winner() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessControlRepository::new(pool);
    let tenant_id = TenantId::new();
    let invitation = issue(tenant_id, BuiltInRole::Viewer.into(), "race");
    assert!(repository.create_invitation(invitation.clone()).await.is_ok());

    let (left, right) = tokio::join!(
        repository.accept_invitation(tenant_id, invitation.token_hash(), "left", Utc::now()),
        repository.accept_invitation(tenant_id, invitation.token_hash(), "right", Utc::now()),
    );

    let outcomes = [left, right];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|outcome| matches!(
        outcome,
        Err(AppError::InvitationAlreadyConsumed(_))
    )));
}

#[tokio::test]
async fn token_lookup_is_tenant_scoped() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessControlRepository::new(pool);
    let tenant_id = TenantId::new();
    let invitation = issue(tenant_id, BuiltInRole::Viewer.into(), "scoped");
    assert!(repository.create_invitation(invitation.clone()).await.is_ok());

    let wrong_tenant = repository
        .accept_invitation(TenantId::new(), invitation.token_hash(), "x", Utc::now())
        .await;
    assert!(matches!(wrong_tenant, Err(AppError::Unauthenticated(_))));
}

#[tokio::test]
async fn sweep_expires_overdue_invitations() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessControlRepository::new(pool);
    let tenant_id = TenantId::new();
    let invitation = issue(tenant_id, BuiltInRole::Viewer.into(), "sweep");
    assert!(repository.create_invitation(invitation.clone()).await.is_ok());

    let swept = repository
        .expire_overdue(Utc::now() + Duration::hours(2))
        .await
        .unwrap_or_default();
    assert!(swept >= 1);

    let stored = repository
        .list_invitations(tenant_id)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|invitation| invitation.stored_status())
        .collect::<Vec<_>>();
    assert_eq!(stored, vec![InvitationStatus::Expired]);
}

#[tokio::test]
async fn same_subject_accepting_two_invitations_joins_once() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessControlRepository::new(pool);
    let tenant_id = TenantId::new();
    let first = issue(tenant_id, BuiltInRole::Viewer.into(), "first");
    let second = issue(tenant_id, BuiltInRole::Estimator.into(), "second");
    assert!(repository.create_invitation(first.clone()).await.is_ok());
    assert!(repository.create_invitation(second.clone()).await.is_ok());

    let (left, right) = tokio::join!(
        repository.accept_invitation(tenant_id, first.token_hash(), "crew", Utc::now()),
        repository.accept_invitation(tenant_id, second.token_hash(), "crew", Utc::now()),
    );

    let outcomes = [left, right];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|outcome| matches!(outcome, Err(AppError::Conflict(_))))
    );
}

#[tokio::test]
async fn replacing_from_a_stale_role_is_a_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessControlRepository::new(pool);
    let tenant_id = TenantId::new();
    let invitation = issue(tenant_id, BuiltInRole::Estimator.into(), "stale");
    assert!(repository.create_invitation(invitation.clone()).await.is_ok());
    assert!(
        repository
            .accept_invitation(tenant_id, invitation.token_hash(), "crew", Utc::now())
            .await
            .is_ok()
    );

    let stale = repository
        .replace_assignment(
            tenant_id,
            "crew",
            BuiltInRole::FieldTech.into(),
            BuiltInRole::Viewer.into(),
        )
        .await;
    assert!(matches!(stale, Err(AppError::Conflict(_))));

    let current = repository
        .replace_assignment(
            tenant_id,
            "crew",
            BuiltInRole::Estimator.into(),
            BuiltInRole::Viewer.into(),
        )
        .await
        .unwrap_or_else(|_| panic!("replace"));
    assert_eq!(current.previous, BuiltInRole::Estimator.into());
    assert_eq!(current.current.role, BuiltInRole::Viewer.into());
}
