use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Envy {
    pub app_env: String,
    pub port: Option<u16>,

    pub storage_path: String,

    pub max_upload_size_mb: Option<u64>,
    pub upload_timeout_secs: Option<u64>,
}

impl Envy {
    pub fn storage_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage_path)
    }

    // staging lives inside the storage dir so commits never cross filesystems
    pub fn staging_dir(&self) -> PathBuf {
        self.storage_dir().join(".staging")
    }
}
