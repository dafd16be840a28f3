//! # Eviction Tests
//!
//! Retention behaviour of the archive: records older than `max_storage_days`
//! are removed after every save, then the oldest recordings are removed until
//! the total declared size fits under `max_storage_size`.
//!
//! All tests pin "now" with `save_recording_with_params` / `run_eviction` so
//! timestamps are deterministic.
//!
//! ## Running the Tests
//!
//! ```bash
//! cargo test --test eviction_test
//! ```

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use std::path::PathBuf;

use voice_archive::{
    ArchiveConfig, Quality, RecordingRecord, SaveRecordingRequest, SettingsUpdate, VoiceArchive,
};

const MB: u64 = 1024 * 1024;

/// Helper to open and initialize an archive in a fresh temporary directory
/// Returns (archive, _guard) - keep _guard alive to prevent temp dir deletion
async fn create_test_archive() -> (VoiceArchive, tempfile::TempDir) {
    let guard = tempfile::tempdir().unwrap();
    let archive = VoiceArchive::open(&ArchiveConfig::new(guard.path()))
        .await
        .unwrap();
    archive.initialize().await.unwrap();
    (archive, guard)
}

/// Helper to seed a recording with a declared size
///
/// The blob on disk is tiny; eviction only looks at the recorded `file_size`.
async fn seed_recording(
    archive: &VoiceArchive,
    id: &str,
    created: DateTime<Utc>,
    file_size: u64,
) -> RecordingRecord {
    let record = RecordingRecord {
        id: id.to_string(),
        scripture_id: "john_3_16".to_string(),
        scripture_ref: "John 3:16".to_string(),
        file_uri: archive.files().path_for(id),
        timestamp: created.timestamp_millis(),
        accuracy: 92.0,
        duration: 5.0,
        file_size,
        quality: Quality::Standard,
        tags: BTreeSet::new(),
    };
    tokio::fs::write(&record.file_uri, b"audio").await.unwrap();
    archive.metadata().append(record.clone()).await.unwrap();
    record
}

/// Helper to set the storage quota in megabytes
async fn set_quota(archive: &VoiceArchive, megabytes: Option<u64>) {
    archive
        .update_settings(&SettingsUpdate {
            max_storage_size: Some(megabytes),
            ..Default::default()
        })
        .await
        .unwrap();
}

/// Helper to write a capture file for a new save
fn write_capture(guard: &tempfile::TempDir, bytes: usize) -> PathBuf {
    let path = guard.path().join("capture.tmp");
    std::fs::write(&path, vec![1_u8; bytes]).unwrap();
    path
}

fn ids(records: &[RecordingRecord]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}

#[tokio::test]
async fn test_quota_evicts_two_oldest_of_three_30mb_recordings() {
    let (archive, guard) = create_test_archive().await;
    let now = Utc::now();
    set_quota(&archive, Some(50)).await;

    let first = seed_recording(&archive, "first", now - Duration::hours(3), 30_000_000).await;
    let second = seed_recording(&archive, "second", now - Duration::hours(2), 30_000_000).await;
    seed_recording(&archive, "third", now - Duration::hours(1), 30_000_000).await;

    let capture = write_capture(&guard, 1024);
    let outcome = archive
        .save_recording_with_params(
            SaveRecordingRequest::new("john_3_16", "John 3:16", &capture, 96.0, 5.0),
            Some(now),
        )
        .await
        .unwrap();

    let (record, eviction) = match outcome {
        voice_archive::SaveOutcome::Saved { record, eviction } => (record, eviction),
        other => panic!("expected a saved recording, got {:?}", other),
    };
    assert_eq!(eviction.over_quota, vec!["first".to_string(), "second".to_string()]);
    assert!(eviction.expired.is_empty());
    assert_eq!(eviction.freed_bytes, 60_000_000);

    let remaining = archive.get_all_recordings().await;
    assert_eq!(ids(&remaining), vec![record.id.clone(), "third".to_string()]);
    let total: u64 = remaining.iter().map(|r| r.file_size).sum();
    assert!(total <= 50 * MB);

    assert!(!archive.files().exists(&first.file_uri).await);
    assert!(!archive.files().exists(&second.file_uri).await);
}

#[tokio::test]
async fn test_quota_removes_only_the_oldest_needed() {
    let (archive, _guard) = create_test_archive().await;
    let now = Utc::now();
    set_quota(&archive, Some(3)).await;

    for i in 0..6 {
        let created = now - Duration::minutes(60 - i);
        seed_recording(&archive, &format!("r{}", i), created, MB).await;
    }

    let report = archive.run_eviction(Some(now)).await.unwrap();
    assert_eq!(report.over_quota, vec!["r0", "r1", "r2"]);

    let remaining = archive.get_all_recordings().await;
    assert_eq!(ids(&remaining), vec!["r5", "r4", "r3"]);
    let total: u64 = remaining.iter().map(|r| r.file_size).sum();
    assert!(total <= 3 * MB);
    // Keeping the most recently evicted one would have exceeded the quota
    assert!(total + MB > 3 * MB);
}

#[tokio::test]
async fn test_no_quota_keeps_everything_within_ttl() {
    let (archive, _guard) = create_test_archive().await;
    let now = Utc::now();
    for i in 0..3 {
        seed_recording(&archive, &format!("big{}", i), now - Duration::days(i), 500 * MB).await;
    }

    let report = archive.run_eviction(Some(now)).await.unwrap();
    assert!(report.is_empty());
    assert_eq!(archive.get_all_recordings().await.len(), 3);
}

#[tokio::test]
async fn test_ttl_removes_old_recordings_regardless_of_size() {
    let (archive, guard) = create_test_archive().await;
    let now = Utc::now();
    let stale = seed_recording(&archive, "stale", now - Duration::days(31), 10).await;
    let fresh = seed_recording(&archive, "fresh", now - Duration::days(29), 10).await;

    let capture = write_capture(&guard, 64);
    let outcome = archive
        .save_recording_with_params(
            SaveRecordingRequest::new("romans_8_28", "Romans 8:28", &capture, 91.0, 4.0),
            Some(now),
        )
        .await
        .unwrap();
    let saved = outcome.into_record().unwrap();

    let remaining = archive.get_all_recordings().await;
    assert_eq!(ids(&remaining), vec![saved.id, fresh.id]);
    assert!(!archive.files().exists(&stale.file_uri).await);
    assert!(archive.metadata().get("stale").await.is_none());
}

#[tokio::test]
async fn test_shorter_retention_applies_on_next_pass() {
    let (archive, _guard) = create_test_archive().await;
    let now = Utc::now();
    seed_recording(&archive, "week_old", now - Duration::days(7), 10).await;
    seed_recording(&archive, "today", now - Duration::hours(1), 10).await;

    assert!(archive.run_eviction(Some(now)).await.unwrap().is_empty());

    archive
        .update_settings(&SettingsUpdate {
            max_storage_days: Some(3),
            ..Default::default()
        })
        .await
        .unwrap();
    let report = archive.run_eviction(Some(now)).await.unwrap();
    assert_eq!(report.expired, vec!["week_old"]);
    assert_eq!(ids(&archive.get_all_recordings().await), vec!["today"]);
}

#[tokio::test]
async fn test_new_recording_larger_than_quota_is_evicted_too() {
    let (archive, guard) = create_test_archive().await;
    let now = Utc::now();
    set_quota(&archive, Some(0)).await;
    let older = seed_recording(&archive, "older", now - Duration::minutes(5), 10).await;

    let capture = write_capture(&guard, 256);
    let outcome = archive
        .save_recording_with_params(
            SaveRecordingRequest::new("john_3_16", "John 3:16", &capture, 99.0, 1.0),
            Some(now),
        )
        .await
        .unwrap();

    let record = outcome.record().unwrap().clone();
    match outcome {
        voice_archive::SaveOutcome::Saved { eviction, .. } => {
            assert!(eviction.removed(&older.id));
            assert!(eviction.removed(&record.id));
        }
        other => panic!("expected a saved recording, got {:?}", other),
    }
    assert!(archive.get_all_recordings().await.is_empty());
    assert!(archive.files().list_files().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_records_with_missing_files_are_not_counted() {
    let (archive, _guard) = create_test_archive().await;
    let now = Utc::now();
    set_quota(&archive, Some(2)).await;

    let ghost = seed_recording(&archive, "ghost", now - Duration::minutes(10), 5 * MB).await;
    tokio::fs::remove_file(&ghost.file_uri).await.unwrap();
    seed_recording(&archive, "real", now - Duration::minutes(1), MB).await;

    // Only the visible recording is measured, and it fits
    let report = archive.run_eviction(Some(now)).await.unwrap();
    assert!(report.is_empty());
    assert_eq!(ids(&archive.get_all_recordings().await), vec!["real"]);
}
