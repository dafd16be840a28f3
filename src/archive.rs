//! The voice recording archive
//!
//! `VoiceArchive` owns both stores and is built once at app start, then
//! shared (usually behind an `Arc`). Every public operation returns a tagged
//! result; read paths degrade to defaults or empty collections instead.
//!
//! ```text
//! save_recording:
//! ┌──────────┐   ┌───────────┐   ┌──────────────┐   ┌──────────────┐
//! │ admission│──►│ copy blob │──►│ append record│──►│ evict (TTL,  │
//! │  gates   │   │ into dir  │   │  (metadata)  │   │  then quota) │
//! └──────────┘   └───────────┘   └──────────────┘   └──────────────┘
//!      │ reject        │ fail           │ fail: delete copied blob
//!      ▼               ▼                ▼
//!   Rejected      Err(Admission)   Err(Admission)
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::admission::{self, AdmissionDecision, RejectReason};
use crate::config::ArchiveConfig;
use crate::consistency::{self, RepairReport};
use crate::constants::generate_recording_id;
use crate::db;
use crate::error::{AdmissionStage, ArchiveError, DynError, Result};
use crate::eviction::{self, EvictionReport};
use crate::file_store::FileStore;
use crate::metadata_store::MetadataStore;
use crate::playback::AudioPlayer;
use crate::recording::{RecordingRecord, SaveRecordingRequest};
use crate::report::{CriticalFailure, ErrorReporter, LogReporter};
use crate::settings::{ArchiveSettings, SettingsStore, SettingsUpdate};
use crate::stats::{self, StorageStats};

/// Result of offering a recording to the archive
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved {
        record: RecordingRecord,
        /// Eviction that ran after the record was stored
        eviction: EvictionReport,
    },
    Rejected(RejectReason),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }

    pub fn record(&self) -> Option<&RecordingRecord> {
        match self {
            SaveOutcome::Saved { record, .. } => Some(record),
            SaveOutcome::Rejected(_) => None,
        }
    }

    pub fn into_record(self) -> Option<RecordingRecord> {
        match self {
            SaveOutcome::Saved { record, .. } => Some(record),
            SaveOutcome::Rejected(_) => None,
        }
    }
}

pub struct VoiceArchive {
    pool: SqlitePool,
    files: FileStore,
    metadata: MetadataStore,
    settings: SettingsStore,
    reporter: Arc<dyn ErrorReporter>,
}

impl VoiceArchive {
    /// Open (creating if needed) the archive database described by `config`
    ///
    /// Call `initialize` afterwards to bootstrap the recordings directory.
    pub async fn open(config: &ArchiveConfig) -> Result<Self> {
        config.validate().map_err(ArchiveError::Config)?;

        let db_path = config.database_path();
        let init_err = |source: DynError| ArchiveError::Initialization {
            path: db_path.clone(),
            source,
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| init_err(e.into()))?;
        }
        let pool = db::open_database(&db_path).await.map_err(init_err)?;
        db::init_database_schema(&pool).await.map_err(init_err)?;
        db::ensure_version(&pool).await.map_err(init_err)?;

        Ok(Self::from_pool(
            pool,
            config.recordings_path(),
            config.default_settings(),
        ))
    }

    /// Archive backed by an in-memory database, blobs still live in `recordings_dir`
    pub async fn open_in_memory(recordings_dir: impl Into<PathBuf>) -> Result<Self> {
        let recordings_dir = recordings_dir.into();
        let init_err = |source: DynError| ArchiveError::Initialization {
            path: PathBuf::from(":memory:"),
            source,
        };
        let pool = db::open_in_memory().await.map_err(init_err)?;
        db::init_database_schema(&pool).await.map_err(init_err)?;
        db::ensure_version(&pool).await.map_err(init_err)?;
        Ok(Self::from_pool(
            pool,
            recordings_dir,
            ArchiveSettings::default(),
        ))
    }

    /// Build an archive over an already-initialized database pool
    pub fn from_pool(
        pool: SqlitePool,
        recordings_dir: impl Into<PathBuf>,
        default_settings: ArchiveSettings,
    ) -> Self {
        Self {
            files: FileStore::new(recordings_dir),
            metadata: MetadataStore::new(pool.clone()),
            settings: SettingsStore::new(pool.clone(), default_settings),
            pool,
            reporter: Arc::new(LogReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Bootstrap the recordings directory and persist default settings
    ///
    /// Failure is logged and returned, but the archive stays usable in a
    /// degraded state: the directory is created again lazily on first save.
    pub async fn initialize(&self) -> Result<()> {
        if let Err(e) = self.settings.ensure_persisted().await {
            log::warn!("Failed to persist default archive settings: {}", e);
        }

        if let Err(e) = self.files.ensure_ready().await {
            log::error!(
                "Failed to create recordings directory {}: {}",
                self.files.dir().display(),
                e
            );
            return Err(ArchiveError::Initialization {
                path: self.files.dir().to_path_buf(),
                source: e.into(),
            });
        }

        log::info!("Voice archive ready at {}", self.files.dir().display());
        Ok(())
    }

    /// Close the database pool; the archive must not be used afterwards
    pub async fn close(self) {
        self.pool.close().await;
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Offer a finished recording to the archive
    pub async fn save_recording(&self, request: SaveRecordingRequest) -> Result<SaveOutcome> {
        self.save_recording_with_params(request, None).await
    }

    /// Save with an explicit creation time (for testing and imports)
    pub async fn save_recording_with_params(
        &self,
        request: SaveRecordingRequest,
        reference_time: Option<DateTime<Utc>>,
    ) -> Result<SaveOutcome> {
        request.validate().map_err(ArchiveError::InvalidInput)?;

        let settings = self.settings.get().await;
        let (tags, quality) = match admission::evaluate(&settings, request.accuracy, request.quality) {
            AdmissionDecision::Admit { tags, quality } => (tags, quality),
            AdmissionDecision::Reject(reason) => {
                log::info!(
                    "Not saving recording for {}: {}",
                    request.scripture_id,
                    reason
                );
                return Ok(SaveOutcome::Rejected(reason));
            }
        };

        let now = reference_time.unwrap_or_else(Utc::now);
        let id = generate_recording_id();

        let (file_uri, file_size) = match self.files.copy_in(&request.source_path, &id).await {
            Ok(copied) => copied,
            Err(e) => {
                return Err(self.admission_failed(&request, AdmissionStage::Copy, e.into()));
            }
        };

        let record = RecordingRecord {
            id,
            scripture_id: request.scripture_id.clone(),
            scripture_ref: request.scripture_ref.clone(),
            file_uri,
            timestamp: now.timestamp_millis(),
            accuracy: request.accuracy,
            duration: request.duration,
            file_size,
            quality,
            tags,
        };

        if let Err(e) = self.metadata.append(record.clone()).await {
            // Compensating delete, so no blob is left without a record
            if let Err(delete_err) = self.files.delete(&record.file_uri).await {
                log::error!(
                    "Failed to remove {} after metadata write failed: {}",
                    record.file_uri.display(),
                    delete_err
                );
            }
            return Err(self.admission_failed(&request, AdmissionStage::Persist, e));
        }

        log::info!(
            "Saved recording {} for {} ({:.1}% accuracy, {} bytes)",
            record.id,
            record.scripture_ref,
            record.accuracy,
            record.file_size
        );

        let eviction = match self.evict(&settings, Some(now)).await {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Eviction after saving {} failed: {}", record.id, e);
                EvictionReport::default()
            }
        };

        Ok(SaveOutcome::Saved { record, eviction })
    }

    fn admission_failed(
        &self,
        request: &SaveRecordingRequest,
        stage: AdmissionStage,
        source: DynError,
    ) -> ArchiveError {
        let err = ArchiveError::Admission { stage, source };
        self.reporter.report(CriticalFailure {
            context: "save recording",
            message: err.to_string(),
            retry: Some(request.clone()),
        });
        err
    }

    async fn evict(
        &self,
        settings: &ArchiveSettings,
        reference_time: Option<DateTime<Utc>>,
    ) -> std::result::Result<EvictionReport, DynError> {
        let visible = self.get_all_recordings().await;
        eviction::run(&self.files, &self.metadata, visible, settings, reference_time).await
    }

    /// Apply the TTL and quota policies outside of a save
    pub async fn run_eviction(&self, reference_time: Option<DateTime<Utc>>) -> Result<EvictionReport> {
        let settings = self.settings.get().await;
        self.evict(&settings, reference_time)
            .await
            .map_err(|source| ArchiveError::Persist {
                what: "recordings",
                source,
            })
    }

    /// Every recording whose file is present, newest first
    pub async fn get_all_recordings(&self) -> Vec<RecordingRecord> {
        consistency::visible_records(&self.files, self.metadata.list().await).await
    }

    /// Latest visible recording of a scripture
    pub async fn get_recording_for_scripture(&self, scripture_id: &str) -> Option<RecordingRecord> {
        self.get_all_recordings()
            .await
            .into_iter()
            .find(|r| r.scripture_id == scripture_id)
    }

    /// All visible recordings of a scripture, newest first
    pub async fn get_recordings_for_scripture(&self, scripture_id: &str) -> Vec<RecordingRecord> {
        self.get_all_recordings()
            .await
            .into_iter()
            .filter(|r| r.scripture_id == scripture_id)
            .collect()
    }

    /// Delete a recording and its file
    ///
    /// `Ok(false)` when no record has this id. If the file cannot be deleted
    /// the metadata is left in place and the error is returned.
    pub async fn delete_recording(&self, id: &str) -> Result<bool> {
        let record = match self.metadata.get(id).await {
            Some(record) => record,
            None => return Ok(false),
        };

        self.files
            .delete(&record.file_uri)
            .await
            .map_err(|source| ArchiveError::Delete {
                path: record.file_uri.clone(),
                source,
            })?;

        let removed = self
            .metadata
            .remove_by_id(id)
            .await
            .map_err(|source| ArchiveError::Persist {
                what: "recordings",
                source,
            })?;
        if removed {
            log::info!("Deleted recording {}", id);
        }
        Ok(removed)
    }

    pub async fn get_storage_stats(&self) -> StorageStats {
        stats::compute(&self.get_all_recordings().await)
    }

    pub async fn get_settings(&self) -> ArchiveSettings {
        self.settings.get().await
    }

    pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<ArchiveSettings> {
        self.settings.update(update).await
    }

    /// Whether playback should use the archived voice instead of synthesized speech
    pub async fn should_use_recorded_voice(&self, scripture_id: &str) -> bool {
        if !self.settings.get().await.use_recorded_voice {
            return false;
        }
        self.get_recording_for_scripture(scripture_id).await.is_some()
    }

    /// Load a recording for playback; failures propagate to the caller
    pub async fn play_recording<P: AudioPlayer>(
        &self,
        player: &P,
        file_uri: &Path,
    ) -> Result<P::Handle> {
        if !self.files.exists(file_uri).await {
            return Err(ArchiveError::Playback {
                path: file_uri.to_path_buf(),
                reason: "recording file not found".to_string(),
            });
        }
        player
            .load(file_uri)
            .await
            .map_err(|e| ArchiveError::Playback {
                path: file_uri.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Prune records whose file is gone and report files without a record
    pub async fn repair(&self) -> Result<RepairReport> {
        consistency::repair(&self.files, &self.metadata)
            .await
            .map_err(|source| ArchiveError::Persist {
                what: "recordings",
                source,
            })
    }
}
