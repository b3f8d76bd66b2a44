//! Collision resolution.
//!
//! Decides what happens to a task whose destination is already occupied:
//! byte-identical files go to the duplicates directory, different files with
//! the same name get a versioned filename, and everything else is abandoned.

use crate::checksums::ContentHasher;
use crate::error::EngineError;
use crate::model::TransferTask;
use crate::versioning::next_versioned_path;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Next action for a task that hit an occupied destination.
#[derive(Debug)]
pub enum Resolution {
    /// Confirmed duplicate; retry against the duplicates directory
    Duplicate(TransferTask),
    /// Same name, different content; retry under a versioned name
    Versioned(TransferTask),
    /// Not recoverable; drop the task
    Abandon(EngineError),
}

/// Classify a collision for `task` and build the corrected task.
pub async fn resolve_collision(
    task: &TransferTask,
    duplicates_dir: Option<&Path>,
    hasher: Arc<dyn ContentHasher>,
) -> Resolution {
    let collision = EngineError::DestinationExists {
        path: task.destination.clone(),
    };
    if !task.preserve_duplicate {
        return Resolution::Abandon(collision);
    }

    let source = task.source.clone();
    let destination = task.destination.clone();
    let same_content =
        tokio::task::spawn_blocking(move || hasher.same_content(&source, &destination)).await;

    match same_content {
        Ok(Ok(true)) => reroute_duplicate(task, duplicates_dir),
        Ok(Ok(false)) => {
            let versioned = next_versioned_path(&task.destination);
            warn!(
                source = %task.source.display(),
                occupied = %task.destination.display(),
                retry = %versioned.display(),
                "name clash with different content, versioning filename"
            );
            Resolution::Versioned(task.retarget(versioned, task.preserve_duplicate))
        }
        Ok(Err(e)) => Resolution::Abandon(e),
        Err(join_error) => Resolution::Abandon(EngineError::ReadError {
            path: task.source.clone(),
            source: std::io::Error::other(join_error),
        }),
    }
}

fn reroute_duplicate(task: &TransferTask, duplicates_dir: Option<&Path>) -> Resolution {
    let (Some(dir), Some(name)) = (duplicates_dir, task.source.file_name()) else {
        return Resolution::Abandon(EngineError::DuplicatesDirNotConfigured {
            path: task.source.clone(),
        });
    };

    let rerouted = dir.join(name);
    warn!(
        source = %task.source.display(),
        duplicate_of = %task.destination.display(),
        retry = %rerouted.display(),
        "duplicate content, rerouting to duplicates directory"
    );
    // Further collisions inside the duplicates directory are not resolved again
    Resolution::Duplicate(task.retarget(rerouted, false))
}
