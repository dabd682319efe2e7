use async_trait::async_trait;

use crate::domain::identity::models::LoginCommand;
use crate::domain::identity::models::NewUser;
use crate::domain::identity::models::Principal;
use crate::domain::identity::models::PrincipalSummary;
use crate::domain::identity::models::RegisterCommand;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::UpdateProfileCommand;
use crate::domain::identity::models::User;
use crate::domain::identity::models::UserChanges;
use crate::domain::identity::models::UserId;
use crate::domain::identity::token::IssuedToken;
use crate::identity::errors::IdentityError;

/// Port for registration and login.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new account.
    ///
    /// # Returns
    /// Summary of the created principal
    ///
    /// # Errors
    /// * `DuplicateUser` - Username is already taken
    /// * `DuplicateEmail` - Email is already registered
    /// * `Password` - Hashing failed
    /// * `DatabaseError` - Store operation failed
    async fn register(&self, command: RegisterCommand) -> Result<PrincipalSummary, IdentityError>;

    /// Verify credentials and issue a bearer token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown identifier, wrong password or disabled account
    /// * `DatabaseError` - Store operation failed
    async fn login(
        &self,
        command: LoginCommand,
    ) -> Result<(IssuedToken, PrincipalSummary), IdentityError>;
}

/// Port for user administration and self-service profile operations.
///
/// Every operation takes the calling principal and enforces its own role set.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// All users. ADMIN only.
    async fn list_users(&self, caller: &Principal) -> Result<Vec<User>, IdentityError>;

    /// One user by id. ADMIN only.
    ///
    /// # Errors
    /// * `AccessDenied` - Caller is not an admin
    /// * `UserNotFound` - No user with this id
    async fn get_user(&self, caller: &Principal, id: UserId) -> Result<User, IdentityError>;

    /// Remove a user. ADMIN only.
    ///
    /// # Errors
    /// * `AccessDenied` - Caller is not an admin
    /// * `UserNotFound` - No user with this id
    async fn delete_user(&self, caller: &Principal, id: UserId) -> Result<(), IdentityError>;

    /// Change a user's role. ADMIN only.
    async fn update_role(
        &self,
        caller: &Principal,
        id: UserId,
        role: Role,
    ) -> Result<User, IdentityError>;

    /// Enable or disable an account. ADMIN only.
    async fn set_enabled(
        &self,
        caller: &Principal,
        id: UserId,
        enabled: bool,
    ) -> Result<User, IdentityError>;

    /// The caller's own record. USER or ADMIN.
    async fn get_profile(&self, caller: &Principal) -> Result<User, IdentityError>;

    /// Update the caller's own profile fields. USER or ADMIN.
    ///
    /// # Errors
    /// * `DuplicateEmail` - New email belongs to another user
    async fn update_profile(
        &self,
        caller: &Principal,
        command: UpdateProfileCommand,
    ) -> Result<User, IdentityError>;
}

/// Persistence boundary for user records.
///
/// Implementations own the uniqueness guarantee: `create` and `update_fields` must
/// reject a duplicate username or email atomically, whatever callers checked
/// beforehand.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Insert a new user and assign its id.
    ///
    /// # Errors
    /// * `DuplicateUser` - Username is already taken
    /// * `DuplicateEmail` - Email is already registered
    /// * `DatabaseError` - Store operation failed
    async fn create(&self, user: NewUser) -> Result<User, IdentityError>;

    /// Write the columns set in `changes` in one atomic step and return the
    /// resulting record. Columns left as `None` keep their stored value.
    ///
    /// # Errors
    /// * `UserNotFound` - No user with this id
    /// * `DuplicateEmail` - New email belongs to another user
    /// * `DatabaseError` - Store operation failed
    async fn update_fields(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<User, IdentityError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, IdentityError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, IdentityError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, IdentityError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, IdentityError>;

    /// All users ordered by id.
    async fn list_all(&self) -> Result<Vec<User>, IdentityError>;

    /// # Errors
    /// * `UserNotFound` - No user with this id
    async fn delete(&self, id: UserId) -> Result<(), IdentityError>;
}
