use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::identity::access::require;
use crate::domain::identity::access::ADMIN_ONLY;
use crate::domain::identity::access::AUTHENTICATED;
use crate::domain::identity::models::Principal;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::UpdateProfileCommand;
use crate::domain::identity::models::User;
use crate::domain::identity::models::UserChanges;
use crate::domain::identity::models::UserId;
use crate::identity::errors::IdentityError;
use crate::identity::ports::CredentialStore;
use crate::identity::ports::UserServicePort;

/// Domain service for account administration and self-service profiles.
///
/// Each operation runs the access guard before touching the store.
pub struct UserService<CS>
where
    CS: CredentialStore + ?Sized,
{
    store: Arc<CS>,
}

impl<CS> UserService<CS>
where
    CS: CredentialStore + ?Sized,
{
    pub fn new(store: Arc<CS>) -> Self {
        Self { store }
    }

    async fn load(&self, id: UserId) -> Result<User, IdentityError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| IdentityError::UserNotFound(id.to_string()))
    }
}

#[async_trait]
impl<CS> UserServicePort for UserService<CS>
where
    CS: CredentialStore + ?Sized,
{
    async fn list_users(&self, caller: &Principal) -> Result<Vec<User>, IdentityError> {
        require(Some(caller), ADMIN_ONLY)?;
        self.store.list_all().await
    }

    async fn get_user(&self, caller: &Principal, id: UserId) -> Result<User, IdentityError> {
        require(Some(caller), ADMIN_ONLY)?;
        self.load(id).await
    }

    async fn delete_user(&self, caller: &Principal, id: UserId) -> Result<(), IdentityError> {
        require(Some(caller), ADMIN_ONLY)?;
        self.store.delete(id).await?;

        tracing::info!(user_id = %id, admin_id = %caller.id, "User deleted");
        Ok(())
    }

    async fn update_role(
        &self,
        caller: &Principal,
        id: UserId,
        role: Role,
    ) -> Result<User, IdentityError> {
        require(Some(caller), ADMIN_ONLY)?;

        let changes = UserChanges {
            role: Some(role),
            ..UserChanges::at(Utc::now())
        };
        let user = self.store.update_fields(id, changes).await?;

        tracing::info!(user_id = %id, admin_id = %caller.id, role = %role, "User role changed");
        Ok(user)
    }

    async fn set_enabled(
        &self,
        caller: &Principal,
        id: UserId,
        enabled: bool,
    ) -> Result<User, IdentityError> {
        require(Some(caller), ADMIN_ONLY)?;

        let changes = UserChanges {
            enabled: Some(enabled),
            ..UserChanges::at(Utc::now())
        };
        let user = self.store.update_fields(id, changes).await?;

        tracing::info!(user_id = %id, admin_id = %caller.id, enabled, "User enabled flag changed");
        Ok(user)
    }

    async fn get_profile(&self, caller: &Principal) -> Result<User, IdentityError> {
        require(Some(caller), AUTHENTICATED)?;
        self.load(caller.id).await
    }

    async fn update_profile(
        &self,
        caller: &Principal,
        command: UpdateProfileCommand,
    ) -> Result<User, IdentityError> {
        require(Some(caller), AUTHENTICATED)?;

        self.store
            .update_fields(caller.id, command.into_changes(Utc::now()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::models::EmailAddress;
    use crate::domain::identity::models::NewUser;
    use crate::domain::identity::models::Username;
    use crate::outbound::repositories::InMemoryCredentialStore;

    async fn seed(store: &InMemoryCredentialStore, username: &str, role: Role) -> Principal {
        let now = Utc::now();
        store
            .create(NewUser {
                username: Username::new(username.to_string()).unwrap(),
                email: EmailAddress::new(format!("{}@x.com", username)).unwrap(),
                password_hash: "$argon2id$stub".to_string(),
                role,
                enabled: true,
                first_name: None,
                last_name: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
            .principal()
    }

    async fn fixture() -> (UserService<InMemoryCredentialStore>, Principal, Principal) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let admin = seed(&store, "root", Role::Admin).await;
        let user = seed(&store, "alice", Role::User).await;
        (UserService::new(store), admin, user)
    }

    #[tokio::test]
    async fn test_admin_lists_users() {
        let (service, admin, _) = fixture().await;

        let users = service.list_users(&admin).await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username.as_str(), "root");
    }

    #[tokio::test]
    async fn test_user_cannot_use_admin_operations() {
        let (service, admin, user) = fixture().await;

        assert!(matches!(
            service.list_users(&user).await,
            Err(IdentityError::AccessDenied(_))
        ));
        assert!(matches!(
            service.get_user(&user, admin.id).await,
            Err(IdentityError::AccessDenied(_))
        ));
        assert!(matches!(
            service.delete_user(&user, admin.id).await,
            Err(IdentityError::AccessDenied(_))
        ));
        assert!(matches!(
            service.update_role(&user, user.id, Role::Admin).await,
            Err(IdentityError::AccessDenied(_))
        ));
        assert!(matches!(
            service.set_enabled(&user, admin.id, false).await,
            Err(IdentityError::AccessDenied(_))
        ));

        // Nothing changed.
        let root = service.get_user(&admin, admin.id).await.unwrap();
        assert!(root.enabled);
        let alice = service.get_user(&admin, user.id).await.unwrap();
        assert_eq!(alice.role, Role::User);
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let (service, admin, _) = fixture().await;

        let result = service.get_user(&admin, UserId(99)).await;
        assert!(matches!(result, Err(IdentityError::UserNotFound(id)) if id == "99"));
    }

    #[tokio::test]
    async fn test_admin_updates_role_and_enabled() {
        let (service, admin, user) = fixture().await;

        let promoted = service
            .update_role(&admin, user.id, Role::Admin)
            .await
            .unwrap();
        assert_eq!(promoted.role, Role::Admin);

        let disabled = service.set_enabled(&admin, user.id, false).await.unwrap();
        assert!(!disabled.enabled);
        assert!(disabled.updated_at >= disabled.created_at);
    }

    #[tokio::test]
    async fn test_admin_deletes_user() {
        let (service, admin, user) = fixture().await;

        service.delete_user(&admin, user.id).await.unwrap();
        assert!(matches!(
            service.get_user(&admin, user.id).await,
            Err(IdentityError::UserNotFound(_))
        ));
        assert!(matches!(
            service.delete_user(&admin, user.id).await,
            Err(IdentityError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_update() {
        let (service, _, user) = fixture().await;

        let updated = service
            .update_profile(
                &user,
                UpdateProfileCommand {
                    first_name: Some("Alice".to_string()),
                    last_name: None,
                    email: Some(EmailAddress::new("alice@new.com".to_string()).unwrap()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name.as_deref(), Some("Alice"));
        assert_eq!(updated.last_name, None);
        assert_eq!(updated.email.as_str(), "alice@new.com");

        let profile = service.get_profile(&user).await.unwrap();
        assert_eq!(profile, updated);
    }

    #[tokio::test]
    async fn test_profile_email_taken_by_other_user() {
        let (service, _, user) = fixture().await;

        let result = service
            .update_profile(
                &user,
                UpdateProfileCommand {
                    email: Some(EmailAddress::new("root@x.com".to_string()).unwrap()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(IdentityError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_disabled_principal_cannot_read_profile() {
        let (service, _, mut user) = fixture().await;
        user.enabled = false;

        assert!(matches!(
            service.get_profile(&user).await,
            Err(IdentityError::AccessDenied(_))
        ));
    }

    /// In-memory store whose reads by id stall, so any read-modify-write in
    /// the service overlaps with concurrent writers.
    #[derive(Default)]
    struct SlowReadStore {
        inner: InMemoryCredentialStore,
    }

    #[async_trait]
    impl CredentialStore for SlowReadStore {
        async fn create(&self, user: NewUser) -> Result<User, IdentityError> {
            self.inner.create(user).await
        }

        async fn update_fields(
            &self,
            id: UserId,
            changes: UserChanges,
        ) -> Result<User, IdentityError> {
            self.inner.update_fields(id, changes).await
        }

        async fn find_by_id(&self, id: UserId) -> Result<Option<User>, IdentityError> {
            let user = self.inner.find_by_id(id).await?;
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            Ok(user)
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>, IdentityError> {
            self.inner.find_by_username(username).await
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError> {
            self.inner.find_by_email(email).await
        }

        async fn exists_by_username(&self, username: &str) -> Result<bool, IdentityError> {
            self.inner.exists_by_username(username).await
        }

        async fn exists_by_email(&self, email: &str) -> Result<bool, IdentityError> {
            self.inner.exists_by_email(email).await
        }

        async fn list_all(&self) -> Result<Vec<User>, IdentityError> {
            self.inner.list_all().await
        }

        async fn delete(&self, id: UserId) -> Result<(), IdentityError> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn test_profile_update_and_disable_do_not_overwrite_each_other() {
        let store = Arc::new(SlowReadStore::default());
        let admin = seed(&store.inner, "root", Role::Admin).await;
        let user = seed(&store.inner, "alice", Role::User).await;
        let service = Arc::new(UserService::new(Arc::clone(&store)));

        let profile_update = {
            let service = Arc::clone(&service);
            let user = user.clone();
            tokio::spawn(async move {
                service
                    .update_profile(
                        &user,
                        UpdateProfileCommand {
                            first_name: Some("A".to_string()),
                            ..Default::default()
                        },
                    )
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        service.set_enabled(&admin, user.id, false).await.unwrap();
        profile_update.await.unwrap().unwrap();

        let stored = store.inner.find_by_id(user.id).await.unwrap().unwrap();
        assert!(!stored.enabled);
        assert_eq!(stored.first_name.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_concurrent_role_and_enabled_changes_both_land() {
        let store = Arc::new(SlowReadStore::default());
        let admin = seed(&store.inner, "root", Role::Admin).await;
        let user = seed(&store.inner, "alice", Role::User).await;
        let service = UserService::new(Arc::clone(&store));

        let (promoted, disabled) = tokio::join!(
            service.update_role(&admin, user.id, Role::Admin),
            service.set_enabled(&admin, user.id, false),
        );
        promoted.unwrap();
        disabled.unwrap();

        let stored = store.inner.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Admin);
        assert!(!stored.enabled);
    }
}
