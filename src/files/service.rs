use std::{path::Path, time::Duration};

use axum::{extract::Multipart, http::StatusCode};
use tokio::time::timeout;

use crate::app::{
    env::Envy,
    models::api_error::ApiError,
    util::multipart::multipart::stage_files,
};

use super::{
    dtos::get_files_filter_dto::GetFilesFilterDto,
    enums::upload_state::UploadState,
    errors::FilesApiError,
    models::stored_file::StoredFile,
    registry::FileRegistry,
    util::storage,
};

pub static DEFAULT_MAX_UPLOAD_SIZE_MB: u64 = 50;
pub static DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 30;

pub async fn upload_file(
    multipart: Multipart,
    registry: &FileRegistry,
    envy: &Envy,
) -> Result<StoredFile, ApiError> {
    let staging_dir = envy.staging_dir();
    let storage_dir = envy.storage_dir();
    let max_size_bytes = envy
        .max_upload_size_mb
        .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE_MB)
        * 1024
        * 1024;
    let timeout_secs = envy
        .upload_timeout_secs
        .unwrap_or(DEFAULT_UPLOAD_TIMEOUT_SECS);

    tracing::debug!(state = %UploadState::Receiving.value(), "upload started");

    let result = timeout(
        Duration::from_secs(timeout_secs),
        stage_and_commit(multipart, registry, &staging_dir, &storage_dir, max_size_bytes),
    )
    .await;

    match result {
        Ok(result) => result,
        // the dropped staging file is swept by the janitor
        Err(_) => Err(FilesApiError::UploadTimedOut.value()),
    }
}

async fn stage_and_commit(
    multipart: Multipart,
    registry: &FileRegistry,
    staging_dir: &Path,
    storage_dir: &Path,
    max_size_bytes: u64,
) -> Result<StoredFile, ApiError> {
    let mut staged_files = match stage_files(multipart, staging_dir, max_size_bytes).await {
        Ok(staged_files) => staged_files,
        Err(e) => return Err(e),
    };

    tracing::debug!(state = %UploadState::Validating.value(), "upload staged");

    if staged_files.len() == 0 {
        return Err(ApiError {
            code: StatusCode::BAD_REQUEST,
            message: "Received nothing to upload.".to_string(),
        });
    }

    if staged_files.len() > 1 {
        for staged in &staged_files {
            storage::service::discard_staged(staged).await;
        }

        return Err(ApiError {
            code: StatusCode::BAD_REQUEST,
            message: "Expected a single file per upload.".to_string(),
        });
    }

    let staged = staged_files.remove(0);

    tracing::debug!(id = %staged.id, state = %UploadState::Writing.value(), "committing upload");

    match storage::service::commit_file(&staged, storage_dir).await {
        Ok(storage_key) => {
            let file = StoredFile::from_staged(&staged, &storage_key);

            match registry.register(file).await {
                Ok(file) => {
                    tracing::debug!(id = %file.id, state = %UploadState::Committed.value(), "upload committed");
                    Ok(file)
                }
                Err(e) => Err(e),
            }
        }
        Err(e) => {
            tracing::debug!(id = %staged.id, state = %UploadState::Failed.value(), "upload failed");
            Err(e)
        }
    }
}

pub async fn get_files(
    dto: &GetFilesFilterDto,
    registry: &FileRegistry,
) -> Result<Vec<StoredFile>, ApiError> {
    let query_result = dto.to_query();
    let Ok(query) = query_result else {
        return Err(query_result.err().unwrap());
    };

    Ok(registry.list(&query).await)
}

pub async fn get_file_by_id(id: &str, registry: &FileRegistry) -> Result<StoredFile, ApiError> {
    match registry.lookup(id).await {
        Some(file) => Ok(file),
        None => Err(FilesApiError::FileNotFound.value()),
    }
}

pub async fn download_file_by_id(
    id: &str,
    registry: &FileRegistry,
    envy: &Envy,
) -> Result<(StoredFile, bytes::Bytes), ApiError> {
    match registry.lookup(id).await {
        Some(file) => {
            match storage::service::read_file(&file.storage_key, &envy.storage_dir()).await {
                Ok(bytes) => Ok((file, bytes)),
                Err(e) => Err(e),
            }
        }
        None => Err(FilesApiError::FileNotFound.value()),
    }
}

pub async fn delete_file_by_id(
    id: &str,
    registry: &FileRegistry,
    envy: &Envy,
) -> Result<(), ApiError> {
    match registry.lookup(id).await {
        Some(file) => {
            // bytes first, record second
            match storage::service::delete_file(&file.storage_key, &envy.storage_dir()).await {
                Ok(_) => match registry.remove(id).await {
                    Some(_) => Ok(()),
                    None => Err(FilesApiError::FileNotFound.value()),
                },
                Err(e) => Err(e),
            }
        }
        None => Err(FilesApiError::FileNotFound.value()),
    }
}
