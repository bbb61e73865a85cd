use std::{
    path::Path,
    time::{Duration, UNIX_EPOCH},
};

use tokio::{
    fs,
    task,
    time::{interval, sleep},
};

use crate::{app::util::time::current_time_in_secs, AppState};

// staging files untouched for this long belong to dead uploads
// (client disconnects, timed out requests, crashes before commit)
static STALE_AFTER_SECS: u64 = 1200;

pub fn spawn(state: AppState) {
    tracing::debug!("janitor spawned");

    task::spawn(async move {
        sleep(Duration::from_secs(600)).await;
        let mut interval = interval(Duration::from_secs(600));

        loop {
            interval.tick().await;
            cleanup_staging(&state).await;
        }
    });
}

async fn cleanup_staging(state: &AppState) {
    let staging_dir = state.envy.staging_dir();

    match sweep_staging(&staging_dir, STALE_AFTER_SECS).await {
        Ok(removed) => {
            if removed > 0 {
                tracing::debug!("removed {} stale staging file(s)", removed);
            }
        }
        Err(e) => {
            tracing::error!("cleanup_staging: {:?}", e);
        }
    }
}

async fn sweep_staging(staging_dir: &Path, stale_after_secs: u64) -> Result<usize, std::io::Error> {
    let cutoff = current_time_in_secs().saturating_sub(stale_after_secs);
    let mut entries = fs::read_dir(staging_dir).await?;
    let mut stale = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        let Ok(age) = modified.duration_since(UNIX_EPOCH) else {
            continue;
        };

        if age.as_secs() < cutoff {
            stale.push(entry.path());
        }
    }

    let removed = stale.len();

    let mut futures = Vec::new();
    for path in stale {
        futures.push(fs::remove_file(path));
    }
    let _ = futures::future::join_all(futures).await;

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sweep_removes_stale_files_and_keeps_fresh_ones() {
        let dir = tempfile::tempdir().unwrap();

        let stale_path = dir.path().join("old.part");
        fs::write(&stale_path, b"stale").await.unwrap();

        sleep(Duration::from_millis(2100)).await;

        let fresh_path = dir.path().join("new.part");
        fs::write(&fresh_path, b"fresh").await.unwrap();

        let removed = sweep_staging(dir.path(), 1).await.unwrap();

        assert_eq!(removed, 1);
        assert!(!stale_path.exists());
        assert!(fresh_path.exists());
    }

    #[tokio::test]
    async fn sweep_fails_on_missing_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        assert!(sweep_staging(&missing, 0).await.is_err());
    }
}
