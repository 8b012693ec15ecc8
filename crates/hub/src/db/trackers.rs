use anyhow::anyhow;
use chrono::{DateTime, Utc};

use super::{
    DbClient, NewTracker, StoreError, StoreResult, TrackerFilter, TrackerKind, TrackerRecord,
    TrackerUpdate,
};

type TrackerRow = (
    i64,
    String,
    String,
    String,
    String,
    bool,
    Option<DateTime<Utc>>,
    String,
    i64,
    Option<String>,
    String,
    String,
    DateTime<Utc>,
);

const TRACKER_COLUMNS: &str = "SELECT t.id, t.name, t.url, t.kind, t.message, t.connected, t.last_updated, t.metadata, t.identity_id, i.name, t.create_user, t.update_user, t.created_at FROM trackers t LEFT JOIN identities i ON i.id = t.identity_id";

impl DbClient {
    /// Inserts a tracker and returns the generated id.
    ///
    /// # Errors
    /// Returns [`StoreError::Conflict`] on a duplicate name or an unknown identity.
    pub async fn insert_tracker(&self, tracker: &NewTracker) -> StoreResult<i64> {
        let result = sqlx::query(
            "INSERT INTO trackers (name, url, kind, identity_id, create_user, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&tracker.name)
        .bind(&tracker.url)
        .bind(tracker.kind.as_str())
        .bind(tracker.identity_id)
        .bind(&tracker.create_user)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// # Errors
    /// Returns an error if the query fails or a stored row is malformed.
    pub async fn get_tracker_by_id(&self, tracker_id: i64) -> StoreResult<Option<TrackerRecord>> {
        let row = sqlx::query_as::<_, TrackerRow>(&format!("{TRACKER_COLUMNS} WHERE t.id = ?1"))
            .bind(tracker_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(map_tracker_row).transpose()
    }

    /// Lists trackers ordered by id; unset filter fields match every row.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored row is malformed.
    pub async fn list_trackers(&self, filter: &TrackerFilter) -> StoreResult<Vec<TrackerRecord>> {
        let rows = sqlx::query_as::<_, TrackerRow>(&format!(
            "{TRACKER_COLUMNS} WHERE (?1 IS NULL OR t.kind = ?1) AND (?2 IS NULL OR t.connected = ?2) ORDER BY t.id"
        ))
        .bind(filter.kind.as_deref())
        .bind(filter.connected)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_tracker_row).collect()
    }

    /// Overwrites the caller-settable columns of one tracker and clears its
    /// connection status, which no longer describes the new endpoint.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] when no row has `update.id`, and
    /// [`StoreError::Conflict`] on a duplicate name or an unknown identity.
    pub async fn update_tracker(&self, update: &TrackerUpdate) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE trackers SET name = ?1, url = ?2, kind = ?3, identity_id = ?4, update_user = ?5, connected = 0, message = '' WHERE id = ?6",
        )
        .bind(&update.name)
        .bind(&update.url)
        .bind(update.kind.as_str())
        .bind(update.identity_id)
        .bind(&update.update_user)
        .bind(update.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("tracker {}", update.id)));
        }

        Ok(())
    }

    /// # Errors
    /// Returns [`StoreError::NotFound`] when no row has `tracker_id`.
    pub async fn delete_tracker_by_id(&self, tracker_id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM trackers WHERE id = ?1")
            .bind(tracker_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("tracker {tracker_id}")));
        }

        Ok(())
    }
}

fn map_tracker_row(
    (
        id,
        name,
        url,
        kind,
        message,
        connected,
        last_updated,
        metadata,
        identity_id,
        identity_name,
        create_user,
        update_user,
        created_at,
    ): TrackerRow,
) -> StoreResult<TrackerRecord> {
    let kind = kind
        .parse::<TrackerKind>()
        .map_err(|error| StoreError::Unexpected(anyhow!("tracker {id}: {error}")))?;

    Ok(TrackerRecord {
        id,
        name,
        url,
        kind,
        message,
        connected,
        last_updated,
        metadata,
        identity_id,
        identity_name,
        create_user,
        update_user,
        created_at,
    })
}
