use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;

use crate::domain::identity::models::NewUser;
use crate::domain::identity::models::User;
use crate::domain::identity::models::UserChanges;
use crate::domain::identity::models::UserId;
use crate::identity::errors::IdentityError;
use crate::identity::ports::CredentialStore;

#[derive(Debug, Default)]
struct Users {
    next_id: i64,
    by_id: BTreeMap<UserId, User>,
}

impl Users {
    fn username_taken(&self, username: &str) -> bool {
        self.by_id.values().any(|u| u.username.as_str() == username)
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.by_id
            .values()
            .any(|u| Some(u.id) != except && u.email.as_str() == email)
    }
}

/// Process-local credential store.
///
/// All mutations happen under one mutex, so the uniqueness check and the write
/// are a single atomic step. The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: Mutex<Users>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Users>, IdentityError> {
        self.users
            .lock()
            .map_err(|_| IdentityError::DatabaseError("credential store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create(&self, user: NewUser) -> Result<User, IdentityError> {
        let mut users = self.lock()?;

        if users.username_taken(user.username.as_str()) {
            return Err(IdentityError::DuplicateUser(user.username.to_string()));
        }
        if users.email_taken(user.email.as_str(), None) {
            return Err(IdentityError::DuplicateEmail(
                user.email.as_str().to_string(),
            ));
        }

        users.next_id += 1;
        let user = user.with_id(UserId(users.next_id));
        users.by_id.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_fields(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<User, IdentityError> {
        let mut users = self.lock()?;

        if !users.by_id.contains_key(&id) {
            return Err(IdentityError::UserNotFound(id.to_string()));
        }
        if let Some(email) = &changes.email {
            if users.email_taken(email.as_str(), Some(id)) {
                return Err(IdentityError::DuplicateEmail(email.as_str().to_string()));
            }
        }

        let user = users
            .by_id
            .get_mut(&id)
            .ok_or_else(|| IdentityError::UserNotFound(id.to_string()))?;
        user.apply(changes);

        Ok(user.clone())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, IdentityError> {
        Ok(self.lock()?.by_id.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, IdentityError> {
        Ok(self
            .lock()?
            .by_id
            .values()
            .find(|u| u.username.as_str() == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError> {
        Ok(self
            .lock()?
            .by_id
            .values()
            .find(|u| u.email.as_str() == email)
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, IdentityError> {
        Ok(self.lock()?.username_taken(username))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, IdentityError> {
        Ok(self.lock()?.email_taken(email, None))
    }

    async fn list_all(&self) -> Result<Vec<User>, IdentityError> {
        Ok(self.lock()?.by_id.values().cloned().collect())
    }

    async fn delete(&self, id: UserId) -> Result<(), IdentityError> {
        self.lock()?
            .by_id
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| IdentityError::UserNotFound(id.to_string()))
    }
}
