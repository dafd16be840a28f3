//! Keeping the metadata list and the blob directory in agreement
//!
//! Reads only filter: a record whose blob is gone is hidden but stays stored.
//! Pruning happens in `repair`, which callers run on purpose.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::DynError;
use crate::file_store::FileStore;
use crate::metadata_store::MetadataStore;
use crate::recording::RecordingRecord;

/// Newest first, ties broken by id
pub fn sort_newest_first(records: &mut [RecordingRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
}

/// Records whose blob exists, newest first
pub async fn visible_records(
    files: &FileStore,
    records: Vec<RecordingRecord>,
) -> Vec<RecordingRecord> {
    let mut visible = Vec::with_capacity(records.len());
    for record in records {
        if files.exists(&record.file_uri).await {
            visible.push(record);
        } else {
            log::debug!(
                "Hiding recording {}: file {} is missing",
                record.id,
                record.file_uri.display()
            );
        }
    }
    sort_newest_first(&mut visible);
    visible
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Records dropped because their blob is missing
    pub pruned_records: Vec<String>,
    /// Blobs with no record; reported, never deleted
    pub orphan_files: Vec<PathBuf>,
}

/// Drop records without a blob and report blobs without a record
pub async fn repair(files: &FileStore, metadata: &MetadataStore) -> Result<RepairReport, DynError> {
    let records = metadata.list().await;

    let mut report = RepairReport::default();
    let mut known_files = HashSet::new();
    for record in &records {
        if files.exists(&record.file_uri).await {
            known_files.insert(record.file_uri.clone());
        } else {
            report.pruned_records.push(record.id.clone());
        }
    }

    let pruned: HashSet<String> = report.pruned_records.iter().cloned().collect();
    metadata.remove_many(&pruned).await?;

    report.orphan_files = files
        .list_files()
        .await?
        .into_iter()
        .filter(|path| !known_files.contains(path))
        .collect();

    if !report.pruned_records.is_empty() || !report.orphan_files.is_empty() {
        log::info!(
            "Repair pruned {} records, found {} orphan files",
            report.pruned_records.len(),
            report.orphan_files.len()
        );
    }
    Ok(report)
}
