use std::path::PathBuf;

/// A fully received upload sitting in the staging area, not yet committed.
#[derive(Debug)]
pub struct StagedFile {
    pub id: String,
    pub field_name: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    pub checksum: String,
    pub path: PathBuf,
}
