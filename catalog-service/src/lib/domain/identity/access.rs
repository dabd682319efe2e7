use crate::domain::identity::models::Principal;
use crate::domain::identity::models::Role;
use crate::identity::errors::AccessDenied;

/// Operations reserved for administrators.
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Operations open to any signed-in account.
pub const AUTHENTICATED: &[Role] = &[Role::User, Role::Admin];

/// Guard evaluated at the start of every protected operation.
///
/// Passes only when a principal is present, its account is enabled and its
/// role is one of `allowed`. An empty `allowed` set admits nobody.
///
/// Principals built from bearer tokens carry the role they were signed with
/// and always have `enabled = true`; token validation never reads the store.
/// Disabling or demoting an account therefore takes effect at its next login,
/// not on tokens already issued. The `enabled` check only rejects principals
/// built from a stored record.
pub fn require(principal: Option<&Principal>, allowed: &[Role]) -> Result<(), AccessDenied> {
    let Some(principal) = principal else {
        tracing::warn!("Access denied: no authenticated principal");
        return Err(AccessDenied);
    };

    if !principal.enabled {
        tracing::warn!(user_id = %principal.id, "Access denied: account disabled");
        return Err(AccessDenied);
    }

    if !allowed.contains(&principal.role) {
        tracing::warn!(
            user_id = %principal.id,
            role = %principal.role,
            "Access denied: role not permitted"
        );
        return Err(AccessDenied);
    }

    Ok(())
}
