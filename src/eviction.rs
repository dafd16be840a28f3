//! Storage budget enforcement
//!
//! Two passes over the visible recordings, oldest first:
//! 1. TTL: everything created before `now - max_storage_days` goes
//! 2. Quota: the oldest survivors go until the total fits `max_storage_size`
//!
//! Each pass deletes blobs one by one and then drops the matching metadata in
//! a single batch. A blob that cannot be deleted is logged and skipped; its
//! record is kept so the pointer to a possibly-present file is not lost.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::constants::MILLIS_PER_DAY;
use crate::error::DynError;
use crate::file_store::FileStore;
use crate::metadata_store::MetadataStore;
use crate::recording::RecordingRecord;
use crate::settings::ArchiveSettings;

/// What an eviction run removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Removed by the TTL pass, oldest first
    pub expired: Vec<String>,
    /// Removed by the quota pass, oldest first
    pub over_quota: Vec<String>,
    /// Selected for removal but their blob could not be deleted
    pub skipped: Vec<String>,
    pub freed_bytes: u64,
}

impl EvictionReport {
    pub fn removed_count(&self) -> usize {
        self.expired.len() + self.over_quota.len()
    }

    pub fn is_empty(&self) -> bool {
        self.removed_count() == 0 && self.skipped.is_empty()
    }

    pub fn removed(&self, id: &str) -> bool {
        self.expired.iter().chain(&self.over_quota).any(|r| r == id)
    }
}

/// Records created strictly before this instant (ms) are expired
pub fn ttl_cutoff_ms(now: DateTime<Utc>, max_storage_days: u32) -> i64 {
    now.timestamp_millis()
        .saturating_sub(i64::from(max_storage_days).saturating_mul(MILLIS_PER_DAY))
}

pub fn total_size(records: &[RecordingRecord]) -> u64 {
    records.iter().map(|r| r.file_size).sum()
}

/// Oldest first, ties broken by id so runs are deterministic
pub fn sort_oldest_first(records: &mut [RecordingRecord]) {
    records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
}

/// Run both passes over `visible`
///
/// `reference_time` pins "now" for testing; `None` uses the current time.
pub async fn run(
    files: &FileStore,
    metadata: &MetadataStore,
    mut visible: Vec<RecordingRecord>,
    settings: &ArchiveSettings,
    reference_time: Option<DateTime<Utc>>,
) -> Result<EvictionReport, DynError> {
    let now = reference_time.unwrap_or_else(Utc::now);
    let mut report = EvictionReport::default();
    sort_oldest_first(&mut visible);

    // TTL pass
    let cutoff_ms = ttl_cutoff_ms(now, settings.max_storage_days);
    let (expired, mut remaining): (Vec<_>, Vec<_>) =
        visible.into_iter().partition(|r| r.timestamp < cutoff_ms);

    let mut removed = HashSet::new();
    for record in expired {
        match files.delete(&record.file_uri).await {
            Ok(()) => {
                report.freed_bytes += record.file_size;
                removed.insert(record.id.clone());
                report.expired.push(record.id);
            }
            Err(e) => {
                log::warn!(
                    "Skipping expired recording {}: failed to delete {}: {}",
                    record.id,
                    record.file_uri.display(),
                    e
                );
                report.skipped.push(record.id.clone());
                remaining.push(record);
            }
        }
    }
    metadata.remove_many(&removed).await?;
    if !report.expired.is_empty() {
        log::info!(
            "Evicted {} recordings older than {} days",
            report.expired.len(),
            settings.max_storage_days
        );
    }

    // Quota pass
    let limit = match settings.max_storage_bytes() {
        Some(limit) => limit,
        None => return Ok(report),
    };
    sort_oldest_first(&mut remaining);
    let mut total = total_size(&remaining);

    let mut removed = HashSet::new();
    let mut candidates = remaining.into_iter();
    while total > limit {
        let record = match candidates.next() {
            Some(record) => record,
            None => break,
        };
        match files.delete(&record.file_uri).await {
            Ok(()) => {
                total = total.saturating_sub(record.file_size);
                report.freed_bytes += record.file_size;
                removed.insert(record.id.clone());
                report.over_quota.push(record.id);
            }
            Err(e) => {
                log::warn!(
                    "Skipping recording {} during quota eviction: failed to delete {}: {}",
                    record.id,
                    record.file_uri.display(),
                    e
                );
                if !report.skipped.contains(&record.id) {
                    report.skipped.push(record.id);
                }
            }
        }
    }
    metadata.remove_many(&removed).await?;

    if !report.over_quota.is_empty() {
        log::info!(
            "Evicted {} recordings to fit the {} MB quota ({} bytes in use)",
            report.over_quota.len(),
            settings.max_storage_size.unwrap_or_default(),
            total
        );
    }
    if total > limit {
        log::warn!(
            "Archive still over quota after eviction: {} bytes in use, limit {}",
            total,
            limit
        );
    }

    Ok(report)
}
