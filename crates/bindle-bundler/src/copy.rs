//! The user-declared copy step.
//!
//! Copies static files into the output directory after a successful build.
//! A directory source merges its contents into the destination; a file
//! source is copied under its own name.

use std::path::Path;

use walkdir::WalkDir;

use bindle_config::{CopyEntry, ResolvedOptions};

use crate::error::Result;

/// Run every copy entry of one configuration.
pub async fn copy_assets(options: &ResolvedOptions) -> Result<()> {
    for entry in &options.copy {
        // without an explicit destination, sources land in the output
        // directory under their own names
        let (destination, dest_is_dir) = match &entry.to {
            None => (options.out_dir.clone(), true),
            Some(to) => (to.clone(), to.is_dir()),
        };
        copy_entry(&entry.from, &destination, dest_is_dir).await?;
    }
    Ok(())
}

async fn copy_entry(from: &Path, to: &Path, dest_is_dir: bool) -> Result<()> {
    let metadata = match tokio::fs::metadata(from).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("copy source does not exist: {}", from.display());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if metadata.is_file() {
        let target = if dest_is_dir {
            match from.file_name() {
                Some(name) => to.join(name),
                None => to.to_path_buf(),
            }
        } else {
            to.to_path_buf()
        };
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(from, &target).await?;
        return Ok(());
    }

    // directory: merge contents into the destination
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(|err| {
            std::io::Error::other(format!("failed to walk {}: {err}", from.display()))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(from)
            .unwrap_or(entry.path())
            .to_path_buf();
        let target = to.join(relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(entry.path(), &target).await?;
    }
    Ok(())
}
