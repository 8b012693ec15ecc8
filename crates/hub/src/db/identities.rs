use chrono::{DateTime, Utc};

use super::{DbClient, IdentityRecord, NewIdentity, StoreError, StoreResult};

type IdentityRow = (i64, String, String, String, String, DateTime<Utc>);

impl DbClient {
    /// Inserts an identity, sealing its password, and returns the generated id.
    ///
    /// # Errors
    /// Returns [`StoreError::Conflict`] when the name is already taken, and
    /// [`StoreError::Unexpected`] when a password is given but no secret key is configured.
    pub async fn insert_identity(&self, identity: &NewIdentity) -> StoreResult<i64> {
        let password_encrypted = self.seal_secret(&identity.password)?;
        let result = sqlx::query(
            "INSERT INTO identities (name, kind, user, password_encrypted, create_user, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&identity.name)
        .bind(&identity.kind)
        .bind(&identity.user)
        .bind(&password_encrypted)
        .bind(&identity.create_user)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_identities(&self) -> StoreResult<Vec<IdentityRecord>> {
        let rows = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, name, kind, user, create_user, created_at FROM identities ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(map_identity_row).collect())
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_identity_by_id(&self, identity_id: i64) -> StoreResult<Option<IdentityRecord>> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, name, kind, user, create_user, created_at FROM identities WHERE id = ?1",
        )
        .bind(identity_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_identity_row))
    }

    /// # Errors
    /// Returns [`StoreError::NotFound`] when absent and
    /// [`StoreError::Conflict`] while a tracker still references it.
    pub async fn delete_identity_by_id(&self, identity_id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM identities WHERE id = ?1")
            .bind(identity_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("identity {identity_id}")));
        }

        Ok(())
    }
}

fn map_identity_row(
    (id, name, kind, user, create_user, created_at): IdentityRow,
) -> IdentityRecord {
    IdentityRecord {
        id,
        name,
        kind,
        user,
        create_user,
        created_at,
    }
}
