use crate::models::FileRecord;
use sqlx::SqlitePool;

// SQL kept as module constants so the reconciliation transaction can reuse
// the exact same statements.
pub(crate) const SELECT_FILE_WITH_ID: &str = "SELECT * FROM files WHERE id = ?1";
pub(crate) const SELECT_FILE_FROM_OWNER_WITH_REMOTE_PATH: &str =
    "SELECT * FROM files WHERE owner = ?1 AND remote_path = ?2";
const SELECT_FOLDER_CONTENT: &str = "SELECT * FROM files WHERE parent_id = ?1";
const SELECT_FOLDER_BY_MIMETYPE: &str =
    "SELECT * FROM files WHERE parent_id = ?1 AND mime_type LIKE ?2 || '%'";
pub(crate) const UPSERT_FILE: &str = "INSERT OR REPLACE INTO files \
    (id, parent_id, owner, remote_path, remote_id, mime_type, length, modified_timestamp, etag) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";
const DELETE_FILE_WITH_ID: &str = "DELETE FROM files WHERE id = ?1";

/// Local persisted table of file records: point lookups by id and by the
/// `(owner, remote_path)` unique key, folder listings, upsert, delete.
///
/// Errors stay opaque storage errors; nothing here classifies or retries.
#[derive(Clone)]
pub struct FileStore {
    pool: SqlitePool,
}

impl FileStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_file_by_id(&self, id: i64) -> anyhow::Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(SELECT_FILE_WITH_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    pub async fn get_file_by_owner_and_remote_path(
        &self,
        owner: &str,
        remote_path: &str,
    ) -> anyhow::Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(SELECT_FILE_FROM_OWNER_WITH_REMOTE_PATH)
            .bind(owner)
            .bind(remote_path)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    pub async fn get_folder_content(&self, parent_id: i64) -> anyhow::Result<Vec<FileRecord>> {
        let records = sqlx::query_as::<_, FileRecord>(SELECT_FOLDER_CONTENT)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    pub async fn get_folder_content_by_mime(
        &self,
        parent_id: i64,
        mime_prefix: &str,
    ) -> anyhow::Result<Vec<FileRecord>> {
        let records = sqlx::query_as::<_, FileRecord>(SELECT_FOLDER_BY_MIMETYPE)
            .bind(parent_id)
            .bind(mime_prefix)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Insert-or-replace keyed by `id`. A record without an id inserts a
    /// fresh row; the assigned id is returned either way.
    pub async fn upsert(&self, record: &FileRecord) -> anyhow::Result<i64> {
        let result = sqlx::query(UPSERT_FILE)
            .bind(record.id)
            .bind(record.parent_id)
            .bind(&record.owner)
            .bind(&record.remote_path)
            .bind(&record.remote_id)
            .bind(&record.mime_type)
            .bind(record.length)
            .bind(record.modified_timestamp)
            .bind(&record.etag)
            .execute(&self.pool)
            .await?;
        Ok(match record.id {
            Some(id) => id,
            None => result.last_insert_rowid(),
        })
    }

    /// Removes exactly one record. Deleting a folder does not cascade to
    /// its children here; cascading is a caller decision.
    pub async fn delete_file_by_id(&self, id: i64) -> anyhow::Result<()> {
        sqlx::query(DELETE_FILE_WITH_ID)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
