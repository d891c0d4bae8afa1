use serde::{Deserialize, Serialize};

/// Mime type servers report for folders.
pub const MIME_DIR: &str = "httpd/unix-directory";

/// One remote file or folder mirrored locally.
///
/// `id` is the local surrogate key: assigned at first insertion, stable
/// across every later update of the same `(owner, remote_path)` pair.
/// Favorites, pending transfers and UI selection all key off it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FileRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub owner: String,
    pub remote_path: String,
    /// Server-side identifier, opaque to reconciliation.
    #[serde(default)]
    pub remote_id: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub length: i64,
    #[serde(default)]
    pub modified_timestamp: i64,
    #[serde(default)]
    pub etag: String,
}

impl FileRecord {
    pub fn is_folder(&self) -> bool {
        self.mime_type == MIME_DIR
    }
}
