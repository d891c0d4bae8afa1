use crate::models::FileRecord;
use crate::store;
use sqlx::SqlitePool;
use tracing::debug;

/// Merges incoming remote file records into the local mirror.
///
/// The lookup-then-write pair runs inside one transaction, so two
/// concurrent sync passes for the same `(owner, remote_path)` cannot both
/// observe "no existing record" and insert two rows. Deletion is never
/// inferred here; a vanished remote path is deleted explicitly by id.
#[derive(Clone)]
pub struct ReconciliationEngine {
    pool: SqlitePool,
}

impl ReconciliationEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert with identity preservation: a first observation of the
    /// remote path inserts a fresh row; a repeat observation keeps the
    /// local `id` and `parent_id` and overwrites every other field with
    /// the remote values.
    pub async fn merge(&self, remote: &FileRecord) -> anyhow::Result<i64> {
        let mut tx = self.pool.begin().await?;

        let local = sqlx::query_as::<_, FileRecord>(store::SELECT_FILE_FROM_OWNER_WITH_REMOTE_PATH)
            .bind(&remote.owner)
            .bind(&remote.remote_path)
            .fetch_optional(&mut *tx)
            .await?;

        let mut record = remote.clone();
        match local {
            None => {
                record.id = None;
            }
            Some(local) => {
                // TODO: detect field-level conflicts via etag; replacing
                // wholesale for the moment.
                record.id = local.id;
                record.parent_id = local.parent_id;
            }
        }

        let result = sqlx::query(store::UPSERT_FILE)
            .bind(record.id)
            .bind(record.parent_id)
            .bind(&record.owner)
            .bind(&record.remote_path)
            .bind(&record.remote_id)
            .bind(&record.mime_type)
            .bind(record.length)
            .bind(record.modified_timestamp)
            .bind(&record.etag)
            .execute(&mut *tx)
            .await?;
        let id = match record.id {
            Some(id) => id,
            None => result.last_insert_rowid(),
        };

        tx.commit().await?;
        debug!(owner = %remote.owner, path = %remote.remote_path, id, "merged remote record");
        Ok(id)
    }

    /// Feeds a whole remote listing through [`merge`](Self::merge),
    /// returning the local ids in listing order.
    pub async fn merge_all(&self, records: &[FileRecord]) -> anyhow::Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            ids.push(self.merge(record).await?);
        }
        Ok(ids)
    }
}
