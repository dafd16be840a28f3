use serde::Serialize;
use std::collections::BTreeMap;

use crate::recording::{Quality, RecordingRecord};

/// Aggregate view of the visible archive, computed fresh on each call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub total_recordings: usize,
    /// Sum of `file_size` in bytes
    pub total_storage_used: u64,
    /// Mean accuracy, 0 when the archive is empty
    pub average_accuracy: f64,
    pub recordings_by_quality: BTreeMap<Quality, usize>,
    /// Oldest creation timestamp (ms)
    pub oldest_recording: Option<i64>,
    /// Newest creation timestamp (ms)
    pub newest_recording: Option<i64>,
}

pub fn compute(records: &[RecordingRecord]) -> StorageStats {
    if records.is_empty() {
        return StorageStats::default();
    }

    let mut recordings_by_quality = BTreeMap::new();
    for record in records {
        *recordings_by_quality.entry(record.quality).or_insert(0) += 1;
    }

    let accuracy_sum: f64 = records.iter().map(|r| r.accuracy).sum();

    StorageStats {
        total_recordings: records.len(),
        total_storage_used: records.iter().map(|r| r.file_size).sum(),
        average_accuracy: accuracy_sum / records.len() as f64,
        recordings_by_quality,
        oldest_recording: records.iter().map(|r| r.timestamp).min(),
        newest_recording: records.iter().map(|r| r.timestamp).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn record(id: &str, timestamp: i64, accuracy: f64, file_size: u64, quality: Quality) -> RecordingRecord {
        RecordingRecord {
            id: id.to_string(),
            scripture_id: "john_3_16".to_string(),
            scripture_ref: "John 3:16".to_string(),
            file_uri: PathBuf::from(format!("/archive/{}.m4a", id)),
            timestamp,
            accuracy,
            duration: 5.0,
            file_size,
            quality,
            tags: BTreeSet::new(),
        }
    }

    #[test]
    fn test_empty_archive() {
        let stats = compute(&[]);
        assert_eq!(stats.total_recordings, 0);
        assert_eq!(stats.total_storage_used, 0);
        assert_eq!(stats.average_accuracy, 0.0);
        assert!(stats.recordings_by_quality.is_empty());
        assert_eq!(stats.oldest_recording, None);
        assert_eq!(stats.newest_recording, None);
    }

    #[test]
    fn test_three_recordings() {
        let records = vec![
            record("a", 300, 90.0, 1_000_000, Quality::Standard),
            record("b", 100, 95.0, 2_000_000, Quality::High),
            record("c", 200, 95.0, 1_500_000, Quality::Premium),
        ];
        let stats = compute(&records);
        assert_eq!(stats.total_recordings, 3);
        assert_eq!(stats.total_storage_used, 4_500_000);
        assert!((stats.average_accuracy - 93.333).abs() < 0.01);
        assert_eq!(stats.recordings_by_quality[&Quality::Standard], 1);
        assert_eq!(stats.recordings_by_quality[&Quality::High], 1);
        assert_eq!(stats.recordings_by_quality[&Quality::Premium], 1);
        assert_eq!(stats.oldest_recording, Some(100));
        assert_eq!(stats.newest_recording, Some(300));
    }

    #[test]
    fn test_serializes_quality_keys_lowercase() {
        let stats = compute(&[record("a", 1, 92.0, 10, Quality::High)]);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["recordingsByQuality"]["high"], 1);
        assert_eq!(json["totalStorageUsed"], 10);
    }
}
