use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// User account row. Unique on both username and email; never updated or
/// deleted once created.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

impl User {
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Single lookup matching either field, used for the registration
    /// uniqueness check.
    pub async fn find_by_username_or_email(
        db: &PgPool,
        username: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE username = $1 OR email = $2
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new account with an already-hashed password.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let mut tx = db.begin().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    async fn lookup_matches_on_username_or_email(db: PgPool) -> anyhow::Result<()> {
        User::create(&db, "ana_99", "ana@x.com", "hash").await?;

        let by_username = User::find_by_username_or_email(&db, "ana_99", "other@x.com").await?;
        assert_eq!(by_username.map(|u| u.username), Some("ana_99".to_string()));

        let by_email = User::find_by_username_or_email(&db, "someone_else", "ana@x.com").await?;
        assert_eq!(by_email.map(|u| u.email), Some("ana@x.com".to_string()));

        let neither = User::find_by_username_or_email(&db, "someone_else", "other@x.com").await?;
        assert!(neither.is_none());
        Ok(())
    }

    #[sqlx::test]
    async fn duplicate_username_or_email_is_rejected(db: PgPool) -> anyhow::Result<()> {
        User::create(&db, "ana_99", "ana@x.com", "hash").await?;

        assert!(User::create(&db, "ana_99", "fresh@x.com", "hash").await.is_err());
        assert!(User::create(&db, "fresh_user", "ana@x.com", "hash").await.is_err());

        // The failed inserts must not have left partial rows behind.
        let row = User::find_by_username(&db, "fresh_user").await?;
        assert!(row.is_none());
        Ok(())
    }
}
