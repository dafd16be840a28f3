use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Encoding quality of a stored recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    High,
    Premium,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Standard => "standard",
            Quality::High => "high",
            Quality::Premium => "premium",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Quality::Standard),
            "high" => Ok(Quality::High),
            "premium" => Ok(Quality::Premium),
            other => Err(format!(
                "Invalid quality '{}', expected standard, high or premium",
                other
            )),
        }
    }
}

/// A retained practice-session recording
///
/// `quality`, `tags` and `accuracy` are fixed at admission; no operation
/// edits a stored record in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingRecord {
    pub id: String,
    pub scripture_id: String,
    /// Display reference, e.g. "John 3:16"
    pub scripture_ref: String,
    /// Location of the audio blob inside the managed directory
    pub file_uri: PathBuf,
    /// Creation instant in milliseconds since epoch
    pub timestamp: i64,
    /// Accuracy score (0-100) from the scorer
    pub accuracy: f64,
    /// Duration in seconds
    pub duration: f64,
    /// Size of the stored blob in bytes
    pub file_size: u64,
    pub quality: Quality,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl RecordingRecord {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// A finished recording offered to the archive
///
/// Cloned into critical failure reports so the host can resubmit it.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRecordingRequest {
    pub scripture_id: String,
    pub scripture_ref: String,
    /// Temporary file produced by the capture engine
    pub source_path: PathBuf,
    pub accuracy: f64,
    pub duration: f64,
    /// Falls back to `Quality::Standard` when not supplied
    pub quality: Option<Quality>,
}

impl SaveRecordingRequest {
    pub fn new(
        scripture_id: impl Into<String>,
        scripture_ref: impl Into<String>,
        source_path: impl Into<PathBuf>,
        accuracy: f64,
        duration: f64,
    ) -> Self {
        Self {
            scripture_id: scripture_id.into(),
            scripture_ref: scripture_ref.into(),
            source_path: source_path.into(),
            accuracy,
            duration,
            quality: None,
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Check caller-supplied values before any gate runs
    pub fn validate(&self) -> Result<(), String> {
        if self.scripture_id.trim().is_empty() {
            return Err("scripture_id must not be empty".to_string());
        }
        if !self.accuracy.is_finite() || !(0.0..=100.0).contains(&self.accuracy) {
            return Err(format!(
                "accuracy must be between 0 and 100, got {}",
                self.accuracy
            ));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(format!(
                "duration must be a non-negative number of seconds, got {}",
                self.duration
            ));
        }
        Ok(())
    }
}
