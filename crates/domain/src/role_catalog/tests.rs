use fieldcrew_core::AppError;
use proptest::prelude::*;

use super::{
    CUSTOM_ROLE_COLOR, CUSTOM_ROLE_ICON, RoleCatalog, RoleCatalogDocument, can_manage_role,
};
use crate::{BuiltInRole, Capability, CustomRole, PermissionSet, Role, RoleLevel};

fn built_in_role() -> impl Strategy<Value = BuiltInRole> {
    proptest::sample::select(BuiltInRole::all().to_vec())
}

#[test]
fn field_tech_cannot_view_financials() {
    let catalog = RoleCatalog::standard();
    let permissions = catalog.resolve_built_in("field_tech");
    assert!(matches!(
        permissions,
        Ok(set) if !set.allows(Capability::CanViewFinancials)
    ));
    assert_eq!(
        catalog.level("field_tech").map(|level| level.value()).ok(),
        Some(1)
    );
}

#[test]
fn unknown_built_in_role_is_rejected() {
    let catalog = RoleCatalog::standard();
    assert!(matches!(
        catalog.resolve_built_in("janitor"),
        Err(AppError::UnknownRole(_))
    ));
    assert!(matches!(
        catalog.level("janitor"),
        Err(AppError::UnknownRole(_))
    ));
}

#[test]
fn viewer_is_lowest_privilege_in_standard_catalog() {
    let catalog = RoleCatalog::standard();
    assert_eq!(catalog.lowest_privilege(), BuiltInRole::Viewer);
}

#[test]
fn standard_catalog_survives_document_roundtrip() {
    let catalog = RoleCatalog::standard();
    let reloaded = RoleCatalog::from_document(catalog.to_document());
    assert!(matches!(reloaded, Ok(value) if value == catalog));
}

#[test]
fn document_with_unknown_capability_is_rejected() {
    let mut document = RoleCatalog::standard().to_document();
    if let Some(row) = document.roles.first_mut() {
        row.permissions.push("canTeleport".to_owned());
    }
    assert!(RoleCatalog::from_document(document).is_err());
}

#[test]
fn document_with_unknown_role_is_rejected() {
    let mut document = RoleCatalog::standard().to_document();
    if let Some(row) = document.roles.first_mut() {
        row.name = "janitor".to_owned();
    }
    assert!(matches!(
        RoleCatalog::from_document(document),
        Err(AppError::UnknownRole(_))
    ));
}

#[test]
fn document_missing_role_is_rejected() {
    let mut document = RoleCatalog::standard().to_document();
    document.roles.retain(|row| row.name != "viewer");
    assert!(RoleCatalog::from_document(document).is_err());
}

#[test]
fn document_with_unsupported_version_is_rejected() {
    let document = RoleCatalogDocument {
        version: 99,
        ..RoleCatalog::standard().to_document()
    };
    assert!(RoleCatalog::from_document(document).is_err());
}

#[test]
fn document_with_tied_lowest_level_is_rejected() {
    let mut document = RoleCatalog::standard().to_document();
    for row in &mut document.roles {
        if row.name == "field_tech" {
            row.level = 0;
        }
    }
    assert!(RoleCatalog::from_document(document).is_err());
}

#[test]
fn manage_roles_override_beats_lower_level() {
    let compliance = PermissionSet::from_granted([Capability::CanManageRoles]);
    assert!(can_manage_role(
        RoleLevel::new(2),
        &compliance,
        RoleLevel::new(4)
    ));
    assert!(!can_manage_role(
        RoleLevel::new(2),
        &PermissionSet::empty(),
        RoleLevel::new(2)
    ));
}

#[test]
fn presentation_lookups_cover_built_in_and_custom_roles() {
    let catalog = RoleCatalog::standard();
    let owner = catalog
        .role(BuiltInRole::Owner)
        .unwrap_or_else(|_| panic!("owner is in the standard catalog"));
    assert_eq!(catalog.role_display_name(&owner), "Owner");
    assert_eq!(
        Some(catalog.role_color(&owner)),
        catalog.color(BuiltInRole::Owner)
    );

    let regional_lead = CustomRole::new(
        fieldcrew_core::TenantId::new(),
        "Regional Lead",
        RoleLevel::new(3),
        PermissionSet::empty(),
        chrono::Utc::now(),
    )
    .map(Role::Custom)
    .unwrap_or_else(|_| panic!("valid custom role"));
    assert_eq!(catalog.role_display_name(&regional_lead), "Regional Lead");
    assert_eq!(catalog.role_color(&regional_lead), CUSTOM_ROLE_COLOR);
    assert_eq!(catalog.role_icon(&regional_lead), CUSTOM_ROLE_ICON);
    assert_eq!(regional_lead.level().value(), 3);
}

proptest! {
    #[test]
    fn resolve_built_in_is_stable(role in built_in_role()) {
        let first = RoleCatalog::standard();
        let second = RoleCatalog::standard();
        let a = first.resolve_built_in(role.as_str()).cloned().ok();
        let b = first.resolve_built_in(role.as_str()).cloned().ok();
        let c = second.resolve_built_in(role.as_str()).cloned().ok();
        prop_assert!(a.is_some());
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &c);
    }

    #[test]
    fn level_comparison_is_antisymmetric(actor in built_in_role(), target in built_in_role()) {
        let catalog = RoleCatalog::standard();
        let actor_level = catalog.level_of(actor).unwrap_or_default();
        let target_level = catalog.level_of(target).unwrap_or_default();
        let plain = PermissionSet::empty();

        if actor_level > target_level {
            prop_assert!(can_manage_role(actor_level, &plain, target_level));
            prop_assert!(!can_manage_role(target_level, &plain, actor_level));
        }
        prop_assert!(!can_manage_role(actor_level, &plain, actor_level));
    }
}
