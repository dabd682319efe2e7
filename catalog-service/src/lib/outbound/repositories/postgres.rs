use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::NewUser;
use crate::domain::identity::models::User;
use crate::domain::identity::models::UserChanges;
use crate::domain::identity::models::UserId;
use crate::domain::identity::models::Username;
use crate::identity::errors::IdentityError;
use crate::identity::ports::CredentialStore;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, enabled, \
                            first_name, last_name, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    enabled: bool,
    first_name: Option<String>,
    last_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = IdentityError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(r.id),
            username: Username::new(r.username)?,
            email: EmailAddress::new(r.email)?,
            password_hash: r.password_hash,
            role: r.role.parse()?,
            enabled: r.enabled,
            first_name: r.first_name,
            last_name: r.last_name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Credential store backed by the `users` table.
///
/// Uniqueness is enforced by the `users_username_key` and `users_email_key`
/// constraints; violations come back as `DuplicateUser` / `DuplicateEmail`.
/// Updates are column-scoped single statements.
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<User>, IdentityError> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?
            .map(User::try_from)
            .transpose()
    }

    async fn exists_where(&self, column: &str, value: &str) -> Result<bool, IdentityError> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM users WHERE {} = $1)", column);

        sqlx::query_scalar::<_, bool>(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))
    }
}

fn map_write_error(
    e: sqlx::Error,
    username: Option<&Username>,
    email: Option<&EmailAddress>,
) -> IdentityError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            match (db_err.constraint(), username, email) {
                (Some("users_username_key"), Some(username), _) => {
                    return IdentityError::DuplicateUser(username.to_string());
                }
                (Some("users_email_key"), _, Some(email)) => {
                    return IdentityError::DuplicateEmail(email.as_str().to_string());
                }
                _ => {}
            }
        }
    }
    IdentityError::DatabaseError(e.to_string())
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn create(&self, user: NewUser) -> Result<User, IdentityError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, email, password_hash, role, enabled,
                               first_name, last_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.enabled)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, Some(&user.username), Some(&user.email)))?;

        Ok(user.with_id(UserId(id)))
    }

    async fn update_fields(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<User, IdentityError> {
        // One statement, so columns not in `changes` are never rewritten from
        // a stale read.
        let sql = format!(
            r#"
            UPDATE users
            SET role = COALESCE($2, role),
                enabled = COALESCE($3, enabled),
                first_name = COALESCE($4, first_name),
                last_name = COALESCE($5, last_name),
                email = COALESCE($6, email),
                updated_at = $7
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.0)
            .bind(changes.role.map(|role| role.as_str()))
            .bind(changes.enabled)
            .bind(&changes.first_name)
            .bind(&changes.last_name)
            .bind(changes.email.as_ref().map(|email| email.as_str()))
            .bind(changes.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, None, changes.email.as_ref()))?
            .map(User::try_from)
            .transpose()?
            .ok_or_else(|| IdentityError::UserNotFound(id.to_string()))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, IdentityError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, IdentityError> {
        self.fetch_one_where("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError> {
        self.fetch_one_where("email", email).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, IdentityError> {
        self.exists_where("username", username).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, IdentityError> {
        self.exists_where("email", email).await
    }

    async fn list_all(&self) -> Result<Vec<User>, IdentityError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);

        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn delete(&self, id: UserId) -> Result<(), IdentityError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::UserNotFound(id.to_string()));
        }

        Ok(())
    }
}
