use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::identity::errors::EmailError;
use crate::identity::errors::IdentityError;
use crate::identity::errors::RoleError;
use crate::identity::errors::UsernameError;

/// User aggregate entity, owned by the credential store.
///
/// `password_hash` always holds a PHC hash; plaintext never reaches this type.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: String,
    pub role: Role,
    pub enabled: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Project the stored record into a request-scoped principal.
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            username: self.username.as_str().to_string(),
            role: self.role,
            enabled: self.enabled,
        }
    }

    /// Overwrite only the columns named in `changes`.
    pub fn apply(&mut self, changes: UserChanges) {
        if let Some(role) = changes.role {
            self.role = role;
        }
        if let Some(enabled) = changes.enabled {
            self.enabled = enabled;
        }
        if let Some(first_name) = changes.first_name {
            self.first_name = Some(first_name);
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = Some(last_name);
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        self.updated_at = changes.updated_at;
    }
}

/// A user record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: String,
    pub role: Role,
    pub enabled: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewUser {
    /// Attach the store-assigned id.
    pub fn with_id(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            enabled: self.enabled,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Numeric user identifier assigned by the credential store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Parse the decimal form used in token subjects.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse::<i64>().ok().filter(|id| *id > 0).map(UserId)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Ensures username is 3-32 characters and contains only alphanumeric, underscore, and hyphen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 32;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `TooShort` - Username shorter than 3 characters
    /// * `TooLong` - Username longer than 32 characters
    /// * `InvalidCharacters` - Contains non-alphanumeric characters (except _ and -)
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let length = username.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        if length > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return Err(UsernameError::InvalidCharacters);
        }
        Ok(Self(username))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Closed set of roles a principal can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            _ => Err(RoleError::Unknown(s.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated identity attached to a single request.
///
/// Passed explicitly to every operation that needs to know who is calling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub enabled: bool,
}

impl Principal {
    pub fn summary(&self) -> PrincipalSummary {
        PrincipalSummary {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// Public view of a principal returned by register and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalSummary {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

/// Command to register a new user with validated fields
#[derive(Debug)]
pub struct RegisterCommand {
    pub username: Username,
    pub email: EmailAddress,
    pub password: String,
    pub role: Role,
}

impl RegisterCommand {
    /// Validate raw registration input.
    ///
    /// # Errors
    /// * `Validation` - A required field is blank
    /// * `InvalidUsername` / `InvalidEmail` / `InvalidRole` - Field fails its format check
    pub fn parse(
        username: String,
        email: String,
        password: String,
        role: String,
    ) -> Result<Self, IdentityError> {
        require_present("username", &username)?;
        require_present("email", &email)?;
        require_present("password", &password)?;
        require_present("role", &role)?;

        Ok(Self {
            username: Username::new(username)?,
            email: EmailAddress::new(email)?,
            password,
            role: role.parse()?,
        })
    }
}

/// Command to log in with a username or an email address
#[derive(Debug)]
pub struct LoginCommand {
    pub identifier: String,
    pub password: String,
}

impl LoginCommand {
    /// # Errors
    /// * `Validation` - Identifier or password is blank
    pub fn parse(identifier: String, password: String) -> Result<Self, IdentityError> {
        require_present("identifier", &identifier)?;
        require_present("password", &password)?;
        Ok(Self {
            identifier: identifier.trim().to_string(),
            password,
        })
    }
}

/// Partial update of the caller's own profile.
///
/// Only provided fields are changed.
#[derive(Debug, Default)]
pub struct UpdateProfileCommand {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<EmailAddress>,
}

impl UpdateProfileCommand {
    pub fn into_changes(self, updated_at: DateTime<Utc>) -> UserChanges {
        UserChanges {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            ..UserChanges::at(updated_at)
        }
    }
}

/// Column-scoped write handed to the credential store.
///
/// `None` leaves the stored column as it is, so concurrent writes to
/// different columns of the same user never undo each other.
#[derive(Debug, Clone, PartialEq)]
pub struct UserChanges {
    pub role: Option<Role>,
    pub enabled: Option<bool>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<EmailAddress>,
    pub updated_at: DateTime<Utc>,
}

impl UserChanges {
    /// An empty change set stamped with `updated_at`.
    pub fn at(updated_at: DateTime<Utc>) -> Self {
        Self {
            role: None,
            enabled: None,
            first_name: None,
            last_name: None,
            email: None,
            updated_at,
        }
    }
}

fn require_present(field: &str, value: &str) -> Result<(), IdentityError> {
    if value.trim().is_empty() {
        Err(IdentityError::Validation(format!("{} is required", field)))
    } else {
        Ok(())
    }
}
