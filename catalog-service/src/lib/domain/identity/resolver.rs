use std::sync::Arc;

use crate::domain::identity::models::Principal;
use crate::domain::identity::models::User;
use crate::identity::errors::IdentityError;
use crate::identity::ports::CredentialStore;

/// A principal together with the credential it must be checked against.
#[derive(Debug, Clone)]
pub struct ResolvedPrincipal {
    pub principal: Principal,
    pub password_hash: String,
}

impl From<User> for ResolvedPrincipal {
    fn from(user: User) -> Self {
        Self {
            principal: user.principal(),
            password_hash: user.password_hash,
        }
    }
}

/// Loads principals from the credential store by username or email.
pub struct PrincipalResolver<CS>
where
    CS: CredentialStore + ?Sized,
{
    store: Arc<CS>,
}

impl<CS> PrincipalResolver<CS>
where
    CS: CredentialStore + ?Sized,
{
    pub fn new(store: Arc<CS>) -> Self {
        Self { store }
    }

    /// Resolve `identifier` as a username first, then as an email address.
    ///
    /// Read-only.
    ///
    /// # Errors
    /// * `PrincipalNotFound` - Neither lookup matched
    /// * `DatabaseError` - Store operation failed
    pub async fn resolve(&self, identifier: &str) -> Result<ResolvedPrincipal, IdentityError> {
        if let Some(user) = self.store.find_by_username(identifier).await? {
            return Ok(user.into());
        }

        self.store
            .find_by_email(identifier)
            .await?
            .map(ResolvedPrincipal::from)
            .ok_or_else(|| IdentityError::PrincipalNotFound(identifier.to_string()))
    }
}
