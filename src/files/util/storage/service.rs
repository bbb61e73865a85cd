use std::{io, path::Path};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncReadExt};

use crate::{
    app::{
        errors::DefaultApiError, models::api_error::ApiError,
        util::multipart::models::staged_file::StagedFile,
    },
    files::errors::FilesApiError,
};

use super::locks;

/// Atomically publishes a staged file under its final key. If the id was
/// already committed the first writer wins: an identical checksum counts as
/// a successful retry, anything else is a conflict.
pub async fn commit_file(staged: &StagedFile, storage_dir: &Path) -> Result<String, ApiError> {
    let lock = locks::lock_for_id(&staged.id);
    let _guard = lock.lock().await;

    let dest = storage_dir.join(&staged.id);

    match fs::metadata(&dest).await {
        Ok(_) => {
            let existing_checksum = match checksum_of(&dest).await {
                Ok(checksum) => checksum,
                Err(e) => {
                    tracing::error!(%e);
                    discard_staged(staged).await;
                    return Err(DefaultApiError::InternalServerError.value());
                }
            };

            discard_staged(staged).await;

            match existing_checksum == staged.checksum {
                true => Ok(staged.id.to_string()),
                false => Err(FilesApiError::ContentMismatch.value()),
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            match fs::rename(&staged.path, &dest).await {
                Ok(_) => Ok(staged.id.to_string()),
                Err(e) => {
                    tracing::error!(%e);
                    discard_staged(staged).await;
                    Err(DefaultApiError::InternalServerError.value())
                }
            }
        }
        Err(e) => {
            tracing::error!(%e);
            discard_staged(staged).await;
            Err(DefaultApiError::InternalServerError.value())
        }
    }
}

pub async fn read_file(storage_key: &str, storage_dir: &Path) -> Result<Bytes, ApiError> {
    match fs::read(storage_dir.join(storage_key)).await {
        Ok(bytes) => Ok(Bytes::from(bytes)),
        Err(e) => {
            tracing::error!(%e);
            Err(FilesApiError::FileNotFound.value())
        }
    }
}

pub async fn delete_file(storage_key: &str, storage_dir: &Path) -> Result<(), ApiError> {
    let lock = locks::lock_for_id(storage_key);
    let _guard = lock.lock().await;

    match fs::remove_file(storage_dir.join(storage_key)).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FilesApiError::FileNotFound.value()),
        Err(e) => {
            tracing::error!(%e);
            Err(DefaultApiError::InternalServerError.value())
        }
    }
}

pub async fn discard_staged(staged: &StagedFile) {
    if let Err(e) = fs::remove_file(&staged.path).await {
        tracing::warn!("failed to discard staged file {}: {:?}", staged.id, e);
    }
}

pub async fn checksum_of(path: &Path) -> Result<String, io::Error> {
    let mut file = fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use axum::http::StatusCode;

    use super::*;

    struct Dirs {
        _tmp: tempfile::TempDir,
        staging: PathBuf,
        storage: PathBuf,
    }

    async fn dirs() -> Dirs {
        let tmp = tempfile::tempdir().unwrap();
        let storage = tmp.path().join("store");
        let staging = storage.join(".staging");
        fs::create_dir_all(&staging).await.unwrap();

        Dirs {
            _tmp: tmp,
            staging,
            storage,
        }
    }

    async fn stage_bytes(staging_dir: &Path, id: &str, content: &[u8]) -> StagedFile {
        let path = staging_dir.join([id, ".part"].concat());
        fs::write(&path, content).await.unwrap();

        StagedFile {
            id: id.to_string(),
            field_name: "file".to_string(),
            file_name: [id, ".bin"].concat(),
            mime_type: "application/octet-stream".to_string(),
            size: content.len() as u64,
            checksum: hex::encode(Sha256::digest(content)),
            path,
        }
    }

    #[tokio::test]
    async fn commit_moves_bytes_out_of_staging() {
        let dirs = dirs().await;
        let staged = stage_bytes(&dirs.staging, "f1", b"0123456789").await;

        let key = commit_file(&staged, &dirs.storage).await.unwrap();

        assert_eq!(key, "f1");
        assert!(!staged.path.exists());
        assert_eq!(
            fs::read(dirs.storage.join("f1")).await.unwrap(),
            b"0123456789"
        );
    }

    #[tokio::test]
    async fn committed_checksum_matches_a_recomputation_over_stored_bytes() {
        let dirs = dirs().await;
        let staged = stage_bytes(&dirs.staging, "f1", b"0123456789").await;
        let expected = staged.checksum.to_string();

        commit_file(&staged, &dirs.storage).await.unwrap();

        let recomputed = checksum_of(&dirs.storage.join("f1")).await.unwrap();
        assert_eq!(recomputed, expected);
        assert_eq!(
            recomputed,
            "84d89877f0d4041efb6bf91a16f0248f2fd573e6af05c19f96bedb9f882f7882"
        );
    }

    #[tokio::test]
    async fn recommitting_identical_content_is_idempotent() {
        let dirs = dirs().await;
        let first = stage_bytes(&dirs.staging, "f1", b"same bytes").await;
        let retry = stage_bytes(&dirs.staging, "f1", b"same bytes").await;

        commit_file(&first, &dirs.storage).await.unwrap();
        let result = commit_file(&retry, &dirs.storage).await;

        assert!(result.is_ok());
        // the retry's staging copy is gone either way
        assert!(!retry.path.exists());
    }

    #[tokio::test]
    async fn recommitting_different_content_keeps_the_first_write() {
        let dirs = dirs().await;
        let first = stage_bytes(&dirs.staging, "f1", b"original").await;
        let second = stage_bytes(&dirs.staging, "f1", b"impostor").await;

        commit_file(&first, &dirs.storage).await.unwrap();
        let err = commit_file(&second, &dirs.storage).await.unwrap_err();

        assert_eq!(err.code, StatusCode::CONFLICT);
        assert!(!second.path.exists());
        assert_eq!(
            fs::read(dirs.storage.join("f1")).await.unwrap(),
            b"original"
        );
    }

    #[tokio::test]
    async fn missing_staged_file_fails_without_leaving_a_visible_file() {
        let dirs = dirs().await;
        let mut staged = stage_bytes(&dirs.staging, "f1", b"content").await;
        staged.path = dirs.staging.join("vanished.part");

        let err = commit_file(&staged, &dirs.storage).await.unwrap_err();

        assert_eq!(err.code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!dirs.storage.join("f1").exists());
    }

    #[tokio::test]
    async fn distinct_ids_commit_in_parallel() {
        let dirs = dirs().await;
        let a = stage_bytes(&dirs.staging, "para-a", b"aaaa").await;
        let b = stage_bytes(&dirs.staging, "para-b", b"bbbb").await;

        let (res_a, res_b) = tokio::join!(
            commit_file(&a, &dirs.storage),
            commit_file(&b, &dirs.storage)
        );

        assert!(res_a.is_ok());
        assert!(res_b.is_ok());
    }

    #[tokio::test]
    async fn colliding_commits_serialize_and_first_writer_wins() {
        let dirs = dirs().await;
        let a = stage_bytes(&dirs.staging, "race", b"writer a").await;
        let b = stage_bytes(&dirs.staging, "race", b"writer b").await;

        let storage_a = dirs.storage.clone();
        let storage_b = dirs.storage.clone();

        let task_a = tokio::spawn(async move { commit_file(&a, &storage_a).await });
        let task_b = tokio::spawn(async move { commit_file(&b, &storage_b).await });

        let res_a = task_a.await.unwrap();
        let res_b = task_b.await.unwrap();

        // exactly one writer commits, the other is told about the conflict
        assert!(res_a.is_ok() != res_b.is_ok());

        let stored = fs::read(dirs.storage.join("race")).await.unwrap();
        let winner = match res_a.is_ok() {
            true => b"writer a".to_vec(),
            false => b"writer b".to_vec(),
        };
        assert_eq!(stored, winner);
    }

    #[tokio::test]
    async fn delete_removes_committed_bytes() {
        let dirs = dirs().await;
        let staged = stage_bytes(&dirs.staging, "f1", b"here today").await;
        commit_file(&staged, &dirs.storage).await.unwrap();

        delete_file("f1", &dirs.storage).await.unwrap();

        assert!(!dirs.storage.join("f1").exists());
        let err = delete_file("f1", &dirs.storage).await.unwrap_err();
        assert_eq!(err.code, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn read_file_returns_committed_bytes() {
        let dirs = dirs().await;
        let staged = stage_bytes(&dirs.staging, "f1", b"readable").await;
        commit_file(&staged, &dirs.storage).await.unwrap();

        let bytes = read_file("f1", &dirs.storage).await.unwrap();
        assert_eq!(&bytes[..], b"readable");

        let err = read_file("missing", &dirs.storage).await.unwrap_err();
        assert_eq!(err.code, StatusCode::NOT_FOUND);
    }
}
