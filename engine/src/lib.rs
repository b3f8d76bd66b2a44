//! # MediaSort Engine - Media Ingest Transfer Library
//!
//! A headless transfer queue for sorting media files into date folders.
//! Designed as the foundation for multiple front ends (CLI, automation).
//!
//! ## Overview
//!
//! The engine copies or moves files one at a time from a FIFO queue.
//! It features:
//! - Never overwriting an existing file
//! - Byte-identical duplicates rerouted to a separate duplicates directory
//! - Same-name, different-content files stored under versioned filenames
//! - Preserved access and modification times
//! - Lifecycle signals via a listener trait (decoupled from UI technology)
//!
//! ## Basic Usage
//!
//! ```no_run
//! use mediasort_engine::{
//!     ChannelListener, ChecksumAlgorithm, DateFolderResolver, ExifDateResolver, Mode,
//!     TransferEngine, TransferEvent, TransferTask,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = tokio::runtime::Runtime::new()?;
//! let (listener, events) = ChannelListener::new();
//! let engine = TransferEngine::new(runtime.handle(), ChecksumAlgorithm::Md5, listener);
//! engine.set_duplicates_dir("/photos/duplicates")?;
//!
//! // Sort a file into its YYYY-MM folder
//! let source = "/card/DCIM/img.jpg";
//! let folder = ExifDateResolver.resolve(source.as_ref())?;
//! let destination = format!("/photos/{}", folder);
//! engine.submit(TransferTask::new(source, destination, Mode::Copy, true))?;
//!
//! for event in events.iter() {
//!     match event {
//!         TransferEvent::ItemProcessed { task, outcome, .. } => {
//!             println!("{}: {:?}", task.source.display(), outcome)
//!         }
//!         TransferEvent::QueueDrained => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Core data structures (TransferTask, TaskId, enums)
//! - **error**: Error types and handling
//! - **fs_ops**: Low-level filesystem operations
//! - **transfer**: The engine handle (submit, replace, duplicates directory)
//! - **queue**: The pending-task queue
//! - **collision**: Duplicate and name-clash resolution
//! - **versioning**: Versioned filename generation
//! - **events**: Listener trait and channel adapter
//! - **checksums**: Content digests
//! - **date_folder**: `YYYY-MM` labels and the capture-date resolvers

pub mod model;
pub mod error;
pub mod fs_ops;
pub mod transfer;
pub mod queue;
pub mod collision;
pub mod versioning;
pub mod events;
pub mod checksums;
pub mod date_folder;
mod processor;

// Re-export main types and functions
pub use model::{Mode, ProcessorState, TaskId, TransferOutcome, TransferTask};
pub use error::EngineError;
pub use transfer::TransferEngine;
pub use events::{ChannelListener, TransferEvent, TransferListener};
pub use checksums::{compute_file_checksum, ChecksumAlgorithm, ChecksumValue, ContentHasher};
pub use date_folder::{DateFolder, DateFolderParseError, DateFolderResolver, ExifDateResolver, ModifiedTimeResolver};
pub use versioning::next_versioned_path;
