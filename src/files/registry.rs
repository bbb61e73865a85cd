use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::app::models::api_error::ApiError;

use super::{
    dtos::get_files_filter_dto::FilesQuery, errors::FilesApiError, models::stored_file::StoredFile,
};

/// In-memory metadata registry. Records appear here only after their backing
/// bytes are committed.
#[derive(Clone)]
pub struct FileRegistry {
    records: Arc<RwLock<HashMap<String, StoredFile>>>,
}

impl FileRegistry {
    pub fn new() -> FileRegistry {
        FileRegistry {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Ids are unique. Re-registering an id is accepted only when the
    /// checksum matches the existing record; the first registration wins.
    pub async fn register(&self, file: StoredFile) -> Result<StoredFile, ApiError> {
        let mut records = self.records.write().await;

        match records.get(&file.id) {
            Some(existing) => match existing.checksum == file.checksum {
                true => Ok(existing.clone()),
                false => Err(FilesApiError::ContentMismatch.value()),
            },
            None => {
                records.insert(file.id.to_string(), file.clone());
                Ok(file)
            }
        }
    }

    pub async fn lookup(&self, id: &str) -> Option<StoredFile> {
        let records = self.records.read().await;
        records.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<StoredFile> {
        let mut records = self.records.write().await;
        records.remove(id)
    }

    pub async fn list(&self, query: &FilesQuery) -> Vec<StoredFile> {
        let records = self.records.read().await;

        let mut files: Vec<StoredFile> = records
            .values()
            .filter(|file| match &query.filename {
                Some(filename) => &file.filename == filename,
                None => true,
            })
            .filter(|file| match &query.mime_type {
                Some(mime_type) => &file.mime_type == mime_type,
                None => true,
            })
            .filter(|file| match query.cursor {
                Some(cursor) => match query.descending {
                    true => file.created_at < cursor,
                    false => file.created_at > cursor,
                },
                None => true,
            })
            .cloned()
            .collect();

        files.sort_by(|a, b| match query.descending {
            true => (b.created_at, &b.id).cmp(&(a.created_at, &a.id)),
            false => (a.created_at, &a.id).cmp(&(b.created_at, &b.id)),
        });

        files.truncate(query.limit);

        files
    }
}
