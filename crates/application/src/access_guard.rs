use fieldcrew_core::{AppError, AppResult, TenantId, UserIdentity};
use fieldcrew_domain::{Capability, PermissionSet, Role, RoleLevel};
use tracing::warn;

use crate::{EffectivePermissions, PermissionResolver};

/// Proof that a caller was authenticated and their permissions resolved.
///
/// Services accept this instead of raw identities, so a handler cannot reach a
/// protected operation without passing through [`AccessGuard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedContext {
    identity: UserIdentity,
    effective: EffectivePermissions,
}

impl AuthorizedContext {
    /// Returns the caller identity.
    #[must_use]
    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    /// Returns the caller subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.identity.subject()
    }

    /// Returns the tenant every operation is scoped to.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.identity.tenant_id()
    }

    /// Returns the resolved permissions.
    #[must_use]
    pub fn effective(&self) -> &EffectivePermissions {
        &self.effective
    }

    /// Returns the resolved permission set.
    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.effective.permissions
    }

    /// Returns the caller role, absent for non-members.
    #[must_use]
    pub fn role(&self) -> Option<&Role> {
        self.effective.role.as_ref()
    }

    /// Returns the caller hierarchy level.
    #[must_use]
    pub fn level(&self) -> RoleLevel {
        self.effective.level()
    }

    /// Fails with `Forbidden` unless the capability is granted.
    pub fn ensure(&self, capability: Capability) -> AppResult<()> {
        if self.effective.allows(capability) {
            return Ok(());
        }

        warn!(
            tenant_id = %self.identity.tenant_id(),
            subject = self.identity.subject(),
            capability = capability.as_str(),
            "permission denied"
        );
        Err(AppError::Forbidden(format!(
            "subject '{}' is missing capability '{}' in tenant '{}'",
            self.identity.subject(),
            capability.as_str(),
            self.identity.tenant_id()
        )))
    }

    /// Fails with `Forbidden` unless at least one capability is granted.
    pub fn ensure_any(&self, capabilities: &[Capability]) -> AppResult<()> {
        if capabilities
            .iter()
            .any(|capability| self.effective.allows(*capability))
        {
            return Ok(());
        }

        let names = capabilities
            .iter()
            .map(Capability::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        warn!(
            tenant_id = %self.identity.tenant_id(),
            subject = self.identity.subject(),
            capabilities = names.as_str(),
            "permission denied"
        );
        Err(AppError::Forbidden(format!(
            "subject '{}' needs one of [{names}] in tenant '{}'",
            self.identity.subject(),
            self.identity.tenant_id()
        )))
    }

    /// Fails with `Forbidden` unless the caller may manage the target role.
    pub fn ensure_can_manage(&self, target: &Role) -> AppResult<()> {
        if self.effective.can_manage(target) {
            return Ok(());
        }

        warn!(
            tenant_id = %self.identity.tenant_id(),
            subject = self.identity.subject(),
            role = %target.reference(),
            role_level = target.level().value(),
            actor_level = self.level().value(),
            "role management denied"
        );
        Err(AppError::Forbidden(format!(
            "subject '{}' cannot manage role '{}' at level {}",
            self.identity.subject(),
            target.reference(),
            target.level()
        )))
    }
}

/// Single entry point that turns a request identity into an authorized context.
#[derive(Clone)]
pub struct AccessGuard {
    resolver: PermissionResolver,
}

impl AccessGuard {
    /// Creates a guard over the permission resolver.
    #[must_use]
    pub fn new(resolver: PermissionResolver) -> Self {
        Self { resolver }
    }

    /// Returns the resolver used by the guard.
    #[must_use]
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// Resolves the caller's permissions without requiring a capability.
    pub async fn authenticate(&self, caller: Option<&UserIdentity>) -> AppResult<AuthorizedContext> {
        let identity = caller.ok_or_else(|| {
            AppError::Unauthenticated("request carries no authenticated identity".to_owned())
        })?;

        let effective = self
            .resolver
            .effective_permissions(identity.tenant_id(), identity.subject())
            .await?;

        Ok(AuthorizedContext {
            identity: identity.clone(),
            effective,
        })
    }

    /// Resolves the caller and requires a capability.
    ///
    /// Missing identities fail with `Unauthenticated`, missing capabilities
    /// with `Forbidden`.
    pub async fn require_permission(
        &self,
        caller: Option<&UserIdentity>,
        capability: Capability,
    ) -> AppResult<AuthorizedContext> {
        let context = self.authenticate(caller).await?;
        context.ensure(capability)?;
        Ok(context)
    }
}
