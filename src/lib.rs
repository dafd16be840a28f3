//! Voice recording archive
//!
//! Decides which practice-session recordings are kept, stores them across a
//! blob directory and a SQLite key-value table, and keeps both within the
//! configured age and size budgets.
//!
//! # Example
//!
//! ```no_run
//! use voice_archive::{ArchiveConfig, SaveRecordingRequest, VoiceArchive};
//!
//! # async fn run() -> voice_archive::Result<()> {
//! let archive = VoiceArchive::open(&ArchiveConfig::new("/tmp/verse-archive")).await?;
//! archive.initialize().await.ok();
//!
//! let outcome = archive
//!     .save_recording(SaveRecordingRequest::new(
//!         "john_3_16",
//!         "John 3:16",
//!         "/tmp/capture-0001.m4a",
//!         95.0,
//!         5.2,
//!     ))
//!     .await?;
//! println!("saved: {}", outcome.is_saved());
//! # Ok(())
//! # }
//! ```

pub mod admission;
pub mod archive;
pub mod config;
pub mod consistency;
pub mod constants;
pub mod db;
pub mod error;
pub mod eviction;
pub mod file_store;
pub mod metadata_store;
pub mod playback;
pub mod queries;
pub mod recording;
pub mod report;
pub mod schema;
pub mod settings;
pub mod stats;

pub use admission::RejectReason;
pub use archive::{SaveOutcome, VoiceArchive};
pub use config::ArchiveConfig;
pub use consistency::RepairReport;
pub use constants::EXPECTED_DB_VERSION;
pub use error::{ArchiveError, Result};
pub use eviction::EvictionReport;
pub use playback::AudioPlayer;
pub use recording::{Quality, RecordingRecord, SaveRecordingRequest};
pub use report::{CriticalFailure, ErrorReporter};
pub use settings::{ArchiveSettings, SettingsUpdate};
pub use stats::StorageStats;
