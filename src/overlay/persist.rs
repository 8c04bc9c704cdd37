use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::Result;

/// Move a finished overlay out of the scratch directory
///
/// Creates the destination's parent when needed. A rename that fails (for
/// example across filesystems) falls back to copy and remove.
pub async fn relocate_output<P: AsRef<Path>, Q: AsRef<Path>>(from: P, to: Q) -> Result<PathBuf> {
    let from = from.as_ref();
    let to = to.as_ref();

    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    if let Err(e) = fs::rename(from, to).await {
        debug!("Rename of {:?} failed ({}), copying instead", from, e);
        fs::copy(from, to).await?;
        fs::remove_file(from).await?;
    }

    info!("Moved overlay output to {}", to.display());
    Ok(to.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_relocate_creates_parent() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("out.mp4");
        std::fs::write(&from, b"video").unwrap();
        let to = dir.path().join("library").join("kept.mp4");

        let moved = relocate_output(&from, &to).await.unwrap();

        assert_eq!(moved, to);
        assert!(!from.exists());
        assert_eq!(std::fs::read(&to).unwrap(), b"video");
    }

    #[tokio::test]
    async fn test_relocate_missing_source() {
        let dir = tempdir().unwrap();
        let result = relocate_output(dir.path().join("gone.mp4"), dir.path().join("x.mp4")).await;
        assert!(result.is_err());
    }
}
