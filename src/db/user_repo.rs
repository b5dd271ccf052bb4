use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_uuid, StoreError};
use crate::models::{Role, User};

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown role '{}'", row.role).into())
        })?;
        Ok(User {
            id: parse_uuid(&row.id)?,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a regular user. Usernames and emails are unique.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: Role::User,
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::info!("Created user {} <{}>", user.username, user.email);
                Ok(user)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateUser)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::try_from).transpose()?)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, StoreError> {
        self.find(id).await?.ok_or(StoreError::UserNotFound(id))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::try_from).transpose()?)
    }

    pub async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM users ORDER BY created_at, rowid")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| User::try_from(row).map_err(StoreError::from))
            .collect()
    }

    /// Changes the role of the user with this email.
    pub async fn set_role(&self, email: &str, role: Role) -> Result<Option<User>, StoreError> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE email = ?")
            .bind(role.as_str())
            .bind(email)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        tracing::info!("Set role of {} to {}", email, role);
        self.find_by_email(email).await
    }

    /// Deletes a user. Their favorites go with them; their recipes are kept
    /// without an owner.
    pub async fn delete_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Favorite recipe ids, in the order they were added.
    pub async fn favorite_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT recipe_id FROM favorites WHERE user_id = ? ORDER BY rowid")
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|(id,)| parse_uuid(id).map_err(StoreError::from))
            .collect()
    }
}
