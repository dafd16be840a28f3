use uuid::Uuid;

/// Expected database schema version
/// Databases written by another version are left untouched and refused
pub const EXPECTED_DB_VERSION: &str = "1";

/// Metadata key holding the schema version
pub const VERSION_KEY: &str = "version";

/// Metadata key holding the serialized `ArchiveSettings`
pub const SETTINGS_KEY: &str = "voice_archive_settings";

/// Metadata key holding the serialized list of `RecordingRecord`
pub const RECORDINGS_KEY: &str = "voice_archive_recordings";

/// Extension of every blob in the managed recordings directory
pub const RECORDING_EXTENSION: &str = "m4a";

/// Recordings at or above this accuracy are tagged `high-accuracy`
pub const HIGH_ACCURACY_THRESHOLD: f64 = 95.0;

pub const HIGH_ACCURACY_TAG: &str = "high-accuracy";

pub const DEFAULT_DATABASE_FILE: &str = "voice_archive.sqlite";

pub const DEFAULT_RECORDINGS_DIR: &str = "recordings";

pub const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Generate a unique recording ID
/// The ID also names the recording's file, so it stays filesystem-safe
pub fn generate_recording_id() -> String {
    format!("rec_{}", Uuid::new_v4().simple())
}
