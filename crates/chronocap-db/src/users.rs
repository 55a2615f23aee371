//! User repository backed by PostgreSQL.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use chronocap_core::defaults::DEFAULT_USER_NAME;
use chronocap_core::{new_v7, Error, NewUser, Result, User, UserRepository};

const USER_COLUMNS: &str = "id, cognito_sub, nickname, name, avatar, awards";

fn map_row_to_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        cognito_sub: row.get("cognito_sub"),
        nickname: row.get("nickname"),
        name: row.get("name"),
        avatar: row.get("avatar"),
        awards: row.get("awards"),
    }
}

/// Map unique violations (SQLSTATE 23505) to `Conflict`.
fn map_insert_error(e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23505") {
            return Error::Conflict("User already exists".to_string());
        }
    }
    Error::Database(e)
}

/// PostgreSQL user repository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (id, cognito_sub, nickname, name, avatar) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(new_v7())
            .bind(&user.cognito_sub)
            .bind(&user.nickname)
            .bind(user.name.unwrap_or_else(|| DEFAULT_USER_NAME.to_string()))
            .bind(user.avatar.unwrap_or_default())
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)?;
        let user = map_row_to_user(&row);
        info!(
            subsystem = "database",
            component = "users",
            op = "insert",
            user_id = %user.id,
            "User created"
        );
        Ok(user)
    }

    async fn find_by_cognito_sub(&self, sub: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE cognito_sub = $1", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(sub)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(map_row_to_user))
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(map_row_to_user))
    }

    async fn add_award(&self, id: Uuid, award_id: &str) -> Result<Option<User>> {
        // Single statement: the membership check and append are atomic.
        let sql = format!(
            "UPDATE users SET awards = CASE WHEN $2 = ANY(awards) THEN awards \
             ELSE array_append(awards, $2) END \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(award_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(map_row_to_user))
    }
}
