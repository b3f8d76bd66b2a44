//! Filesystem operations module.
//!
//! This module provides low-level operations for:
//! - Moving or copying one file without overwriting the destination
//! - Preserving source timestamps on copies
//! - Creating directories recursively
//! - Enumerating source files for ingest

use crate::error::EngineError;
use crate::model::{Mode, TransferTask};
use filetime::FileTime;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;

/// Run the move-or-copy primitive for a task.
///
/// # Returns
/// Number of bytes transferred
///
/// # Errors
/// `EngineError::DestinationExists` when the destination is occupied; any
/// other variant is an I/O failure the caller cannot recover from.
pub async fn transfer_file(task: &TransferTask) -> Result<u64, EngineError> {
    match task.mode {
        Mode::Copy => copy_file_with_metadata(&task.source, &task.destination).await,
        Mode::Move => move_file(&task.source, &task.destination).await,
    }
}

/// Copy a file from source to destination with timestamp preservation.
///
/// Fails with `DestinationExists` instead of overwriting. A destination that
/// could not be fully written or stamped is removed again.
///
/// # Returns
/// Number of bytes copied
pub async fn copy_file_with_metadata(src: &Path, dst: &Path) -> Result<u64, EngineError> {
    ensure_parent_dir_exists(dst).await?;

    let mut src_file = async_fs::File::open(src)
        .await
        .map_err(|e| EngineError::from_read(e, src))?;

    let src_metadata = src_file
        .metadata()
        .await
        .map_err(|e| EngineError::from_read(e, src))?;
    if !src_metadata.is_file() {
        return Err(EngineError::InvalidPath {
            path: src.to_path_buf(),
            reason: "Source is not a regular file".to_string(),
        });
    }
    let atime = FileTime::from_last_access_time(&src_metadata);
    let mtime = FileTime::from_last_modification_time(&src_metadata);

    // create_new refuses to clobber an existing file
    let mut dst_file = async_fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dst)
        .await
        .map_err(|e| EngineError::from_write(e, dst))?;

    let copied = match tokio::io::copy(&mut src_file, &mut dst_file).await {
        Ok(bytes) => dst_file.flush().await.map(|()| bytes),
        Err(e) => Err(e),
    };
    drop(dst_file);

    let written = copied
        .and_then(|bytes| filetime::set_file_times(dst, atime, mtime).map(|()| bytes))
        .map_err(|e| EngineError::WriteError {
            path: dst.to_path_buf(),
            source: e,
        });
    let bytes_copied = discard_on_error(dst, written).await?;

    Ok(bytes_copied)
}

/// Remove a destination this copy created when a later step failed, so a
/// failed item never leaves a file behind.
async fn discard_on_error<T>(dst: &Path, result: Result<T, EngineError>) -> Result<T, EngineError> {
    if result.is_err() {
        let _ = async_fs::remove_file(dst).await;
    }
    result
}

/// Move a file, refusing to replace an existing destination.
///
/// Uses a rename where possible and falls back to copy + remove when the
/// destination is on another device.
///
/// # Returns
/// Size of the moved file in bytes
pub async fn move_file(src: &Path, dst: &Path) -> Result<u64, EngineError> {
    let src_metadata = async_fs::metadata(src)
        .await
        .map_err(|e| EngineError::from_read(e, src))?;
    if !src_metadata.is_file() {
        return Err(EngineError::InvalidPath {
            path: src.to_path_buf(),
            reason: "Source is not a regular file".to_string(),
        });
    }

    ensure_parent_dir_exists(dst).await?;

    // rename(2) silently replaces files, so check first
    if async_fs::try_exists(dst)
        .await
        .map_err(|e| EngineError::from_write(e, dst))?
    {
        return Err(EngineError::DestinationExists {
            path: dst.to_path_buf(),
        });
    }

    match async_fs::rename(src, dst).await {
        Ok(()) => Ok(src_metadata.len()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            let bytes = copy_file_with_metadata(src, dst).await?;
            async_fs::remove_file(src)
                .await
                .map_err(|e| EngineError::from_read(e, src))?;
            Ok(bytes)
        }
        Err(e) => Err(EngineError::from_write(e, dst)),
    }
}

/// Ensure the parent directory of a path exists, creating it if necessary.
///
/// # Errors
/// Returns EngineError if directory creation fails
pub async fn ensure_parent_dir_exists(path: &Path) -> Result<(), EngineError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };

    match async_fs::metadata(parent).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(EngineError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                "Parent path exists but is not a directory",
            ),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => async_fs::create_dir_all(parent)
            .await
            .map_err(|e| EngineError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            }),
        Err(e) => Err(EngineError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: e,
        }),
    }
}

/// Create a directory and its parents, synchronously.
pub fn ensure_dir_exists(path: &Path) -> Result<(), EngineError> {
    fs::create_dir_all(path).map_err(|e| EngineError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    if fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false) {
        Ok(())
    } else {
        Err(EngineError::InvalidPath {
            path: path.to_path_buf(),
            reason: "Path exists but is not a directory".to_string(),
        })
    }
}

/// Enumerate the files to ingest from `source`.
///
/// A file is returned as-is; a directory yields the regular files inside it,
/// descending into subdirectories when `recursive` is set. Hidden entries
/// (leading `.`) are skipped. Results are sorted for a stable submission order.
///
/// # Errors
/// Returns EngineError if the source cannot be read.
pub fn enumerate_files(source: &Path, recursive: bool) -> Result<Vec<PathBuf>, EngineError> {
    let metadata = fs::metadata(source).map_err(|e| EngineError::from_read(e, source))?;
    if metadata.is_file() {
        return Ok(vec![source.to_path_buf()]);
    }

    fn recurse(path: &Path, recursive: bool, files: &mut Vec<PathBuf>) -> Result<(), EngineError> {
        let entries = fs::read_dir(path).map_err(|e| EngineError::from_read(e, path))?;
        for entry in entries {
            let entry = entry.map_err(|e| EngineError::from_read(e, path))?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            let entry_path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|e| EngineError::from_read(e, &entry_path))?;

            if file_type.is_dir() {
                if recursive {
                    recurse(&entry_path, recursive, files)?;
                }
            } else if fs::metadata(&entry_path).map(|m| m.is_file()).unwrap_or(false) {
                // Follows symlinks; broken links are silently dropped
                files.push(entry_path);
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    recurse(source, recursive, &mut files)?;
    files.sort();
    Ok(files)
}
