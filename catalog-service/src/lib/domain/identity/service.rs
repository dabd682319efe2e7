use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::identity::models::LoginCommand;
use crate::domain::identity::models::NewUser;
use crate::domain::identity::models::PrincipalSummary;
use crate::domain::identity::models::RegisterCommand;
use crate::domain::identity::resolver::PrincipalResolver;
use crate::domain::identity::token::IssuedToken;
use crate::domain::identity::token::TokenProvider;
use crate::identity::errors::IdentityError;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::CredentialStore;

/// Well-formed Argon2id hash that matches no password. Verified against when
/// the identifier is unknown so both rejection paths cost the same.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Domain service for registration and login.
pub struct AuthService<CS>
where
    CS: CredentialStore + ?Sized,
{
    store: Arc<CS>,
    resolver: PrincipalResolver<CS>,
    password_hasher: auth::PasswordHasher,
    token_provider: Arc<TokenProvider>,
}

impl<CS> AuthService<CS>
where
    CS: CredentialStore + ?Sized,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential store implementation
    /// * `token_provider` - Signs tokens for successful logins
    pub fn new(store: Arc<CS>, token_provider: Arc<TokenProvider>) -> Self {
        Self {
            resolver: PrincipalResolver::new(Arc::clone(&store)),
            store,
            password_hasher: auth::PasswordHasher::new(),
            token_provider,
        }
    }
}

#[async_trait]
impl<CS> AuthServicePort for AuthService<CS>
where
    CS: CredentialStore + ?Sized,
{
    async fn register(&self, command: RegisterCommand) -> Result<PrincipalSummary, IdentityError> {
        // Fast path only; the store re-checks atomically on insert.
        if self
            .store
            .exists_by_username(command.username.as_str())
            .await?
        {
            return Err(IdentityError::DuplicateUser(command.username.to_string()));
        }
        if self.store.exists_by_email(command.email.as_str()).await? {
            return Err(IdentityError::DuplicateEmail(
                command.email.as_str().to_string(),
            ));
        }

        let password_hash = self.password_hasher.hash(&command.password)?;

        let now = Utc::now();
        let user = self
            .store
            .create(NewUser {
                username: command.username,
                email: command.email,
                password_hash,
                role: command.role,
                enabled: true,
                first_name: None,
                last_name: None,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            role = %user.role,
            "User registered"
        );

        Ok(user.principal().summary())
    }

    async fn login(
        &self,
        command: LoginCommand,
    ) -> Result<(IssuedToken, PrincipalSummary), IdentityError> {
        let resolved = match self.resolver.resolve(&command.identifier).await {
            Ok(resolved) => resolved,
            Err(IdentityError::PrincipalNotFound(_)) => {
                let _ = self.password_hasher.verify(&command.password, DUMMY_HASH);
                tracing::warn!("Login rejected: unknown identifier");
                return Err(IdentityError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let principal = resolved.principal;

        if !self
            .password_hasher
            .verify(&command.password, &resolved.password_hash)?
        {
            tracing::warn!(user_id = %principal.id, "Login rejected: password mismatch");
            return Err(IdentityError::InvalidCredentials);
        }

        if !principal.enabled {
            tracing::warn!(user_id = %principal.id, "Login rejected: account disabled");
            return Err(IdentityError::InvalidCredentials);
        }

        let issued = self.token_provider.issue(&principal)?;

        tracing::info!(
            user_id = %principal.id,
            role = %principal.role,
            expires_at = issued.expires_at,
            "Login succeeded"
        );

        Ok((issued, principal.summary()))
    }
}
