use std::path::Path;

use axum::{
    extract::{multipart::Field, Multipart},
    http::StatusCode,
};
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::{fs::File, io::AsyncWriteExt};
use uuid::Uuid;

use crate::app::{errors::DefaultApiError, models::api_error::ApiError};

use super::models::staged_file::StagedFile;

/// Streams each file field into the staging area, hashing and size-capping
/// in the same pass. Nothing is buffered whole in memory.
pub async fn stage_files(
    mut multipart: Multipart,
    staging_dir: &Path,
    max_size_bytes: u64,
) -> Result<Vec<StagedFile>, ApiError> {
    let mut vec = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(%e);
                discard_all(&vec).await;
                return Err(ApiError {
                    code: StatusCode::BAD_REQUEST,
                    message: "Failed to read multipart body.".to_string(),
                });
            }
        };

        // fields without a filename are form values, not uploads
        let Some(file_name) = field.file_name().map(|name| name.to_string()) else {
            continue;
        };

        let field_name = field.name().unwrap_or("file").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM.as_ref())
            .to_string();

        if mime_type.parse::<mime::Mime>().is_err() {
            discard_all(&vec).await;
            return Err(ApiError {
                code: StatusCode::BAD_REQUEST,
                message: "Invalid content type.".to_string(),
            });
        }

        match stage_field(field, staging_dir, max_size_bytes, field_name, file_name, mime_type)
            .await
        {
            Ok(staged) => vec.push(staged),
            Err(e) => {
                discard_all(&vec).await;
                return Err(e);
            }
        }
    }

    Ok(vec)
}

async fn stage_field(
    mut field: Field<'_>,
    staging_dir: &Path,
    max_size_bytes: u64,
    field_name: String,
    file_name: String,
    mime_type: String,
) -> Result<StagedFile, ApiError> {
    let id = Uuid::new_v4().to_string();
    let path = staging_dir.join([&id, ".part"].concat());

    let mut file = match File::create(&path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(%e);
            return Err(DefaultApiError::InternalServerError.value());
        }
    };

    let mut hasher = Sha256::new();
    let mut size: u64 = 0;

    loop {
        let chunk: Bytes = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(%e);
                remove_staged(&path).await;
                return Err(ApiError {
                    code: StatusCode::BAD_REQUEST,
                    message: "Failed to read upload stream.".to_string(),
                });
            }
        };

        size += chunk.len() as u64;

        if size > max_size_bytes {
            remove_staged(&path).await;
            return Err(ApiError {
                code: StatusCode::PAYLOAD_TOO_LARGE,
                message: "File exceeds the maximum allowed size.".to_string(),
            });
        }

        hasher.update(&chunk);

        if let Err(e) = file.write_all(&chunk).await {
            tracing::error!(%e);
            remove_staged(&path).await;
            return Err(DefaultApiError::InternalServerError.value());
        }
    }

    if size == 0 {
        remove_staged(&path).await;
        return Err(ApiError {
            code: StatusCode::BAD_REQUEST,
            message: "Received an empty file.".to_string(),
        });
    }

    // bytes must be durable before the commit rename makes them visible
    if let Err(e) = file.sync_all().await {
        tracing::error!(%e);
        remove_staged(&path).await;
        return Err(DefaultApiError::InternalServerError.value());
    }

    let checksum = hex::encode(hasher.finalize());

    Ok(StagedFile {
        id,
        field_name,
        file_name,
        mime_type,
        size,
        checksum,
        path,
    })
}

async fn discard_all(staged_files: &Vec<StagedFile>) {
    for staged in staged_files {
        remove_staged(&staged.path).await;
    }
}

async fn remove_staged(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!("failed to remove staging file {:?}: {:?}", path, e);
    }
}
