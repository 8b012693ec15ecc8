use anyhow::Result;

use super::{DbClient, NewUser, UserRecord};

impl DbClient {
    /// # Errors
    /// Returns an error if the count query fails.
    pub async fn users_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// # Errors
    /// Returns an error if the insert fails, including a duplicate username.
    pub async fn insert_user(&self, user: &NewUser) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, scopes) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.scopes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts `user` only while the table is empty. Returns whether it was inserted.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_first_user(&self, user: &NewUser) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, password_hash, scopes) SELECT ?1, ?2, ?3, ?4 WHERE NOT EXISTS (SELECT 1 FROM users)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.scopes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// # Errors
    /// Returns an error if the lookup query fails.
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, (String, String, String, String)>(
            "SELECT id, username, password_hash, scopes FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, username, password_hash, scopes)| UserRecord {
            id,
            username,
            password_hash,
            scopes,
        }))
    }
}
