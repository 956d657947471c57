//! Cleanup of the working directory after publishing

use crate::config::DisposalPolicy;
use crate::error::Result;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Apply `policy` to `images_dir`
///
/// - [`DisposalPolicy::Delete`] removes `images_dir` recursively and fails if
///   it does not exist.
/// - [`DisposalPolicy::Archive`] moves the top-level files of `images_dir`
///   into `archive_dir` and leaves `images_dir` empty of files.
///
/// # Returns
/// Number of files deleted or archived
pub async fn dispose(policy: DisposalPolicy, images_dir: &Path, archive_dir: &Path) -> Result<usize> {
    match policy {
        DisposalPolicy::Delete => delete_dir(images_dir).await,
        DisposalPolicy::Archive => archive_files(images_dir, archive_dir).await,
    }
}

/// Remove `dir` and everything below it
pub async fn delete_dir(dir: &Path) -> Result<usize> {
    let files = crate::publisher::list_files(dir).await?.len();
    fs::remove_dir_all(dir).await?;

    info!(dir = %dir.display(), files, "deleted image directory");
    Ok(files)
}

/// Move every top-level file of `source_dir` into `archive_dir`
///
/// Same-named files already in the archive are replaced. Subdirectories are
/// not touched.
pub async fn archive_files(source_dir: &Path, archive_dir: &Path) -> Result<usize> {
    fs::create_dir_all(archive_dir).await?;

    let mut moved = 0;
    let mut entries = fs::read_dir(source_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }

        let source = entry.path();
        let target = archive_dir.join(entry.file_name());
        move_file(&source, &target).await?;
        debug!(?source, ?target, "archived file");
        moved += 1;
    }

    info!(
        source = %source_dir.display(),
        archive = %archive_dir.display(),
        files = moved,
        "archived images"
    );
    Ok(moved)
}

async fn move_file(source: &Path, target: &Path) -> Result<()> {
    match fs::rename(source, target).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            // rename(2) cannot cross filesystems
            fs::copy(source, target).await?;
            fs::remove_file(source).await?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
