use serde::Serialize;

use crate::app::util::{multipart::models::staged_file::StagedFile, time};

pub static FILES_SORTABLE_FIELDS: [&str; 1] = ["created_at"];

/// Registered metadata for a committed file. Immutable after registration.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub id: String,
    pub filename: String,
    pub size: u64,
    pub checksum: String,
    pub mime_type: String,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub created_at: i64,
}

impl StoredFile {
    pub fn from_staged(staged: &StagedFile, storage_key: &str) -> StoredFile {
        return StoredFile {
            id: staged.id.to_string(),
            filename: staged.file_name.to_string(),
            size: staged.size,
            checksum: staged.checksum.to_string(),
            mime_type: staged.mime_type.to_string(),
            storage_key: storage_key.to_string(),
            created_at: time::current_time_in_secs() as i64,
        };
    }
}
