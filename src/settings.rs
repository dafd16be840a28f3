use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use tokio::sync::Mutex;

use crate::constants::{BYTES_PER_MEGABYTE, SETTINGS_KEY};
use crate::db;
use crate::error::{ArchiveError, Result};

fn default_auto_save_enabled() -> bool {
    true
}

fn default_minimum_accuracy() -> u8 {
    90
}

fn default_max_storage_days() -> u32 {
    30
}

/// Archive configuration persisted as one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveSettings {
    /// Gates every admission
    #[serde(default = "default_auto_save_enabled")]
    pub auto_save_enabled: bool,
    /// Admission accuracy floor (0-100)
    #[serde(default = "default_minimum_accuracy")]
    pub minimum_accuracy: u8,
    /// Retention window for the TTL pass
    #[serde(default = "default_max_storage_days")]
    pub max_storage_days: u32,
    /// Quota in megabytes, `None` disables the quota pass
    #[serde(default)]
    pub max_storage_size: Option<u64>,
    /// Playback prefers archived recordings over synthesized speech
    #[serde(default)]
    pub use_recorded_voice: bool,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            auto_save_enabled: default_auto_save_enabled(),
            minimum_accuracy: default_minimum_accuracy(),
            max_storage_days: default_max_storage_days(),
            max_storage_size: None,
            use_recorded_voice: false,
        }
    }
}

impl ArchiveSettings {
    /// Quota in bytes, if one is configured
    pub fn max_storage_bytes(&self) -> Option<u64> {
        self.max_storage_size
            .map(|mb| mb.saturating_mul(BYTES_PER_MEGABYTE))
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.minimum_accuracy > 100 {
            return Err(format!(
                "minimum_accuracy must be between 0 and 100, got {}",
                self.minimum_accuracy
            ));
        }
        Ok(())
    }

    /// Overlay the fields present in `update`
    pub fn merged(&self, update: &SettingsUpdate) -> Self {
        Self {
            auto_save_enabled: update.auto_save_enabled.unwrap_or(self.auto_save_enabled),
            minimum_accuracy: update.minimum_accuracy.unwrap_or(self.minimum_accuracy),
            max_storage_days: update.max_storage_days.unwrap_or(self.max_storage_days),
            max_storage_size: update.max_storage_size.unwrap_or(self.max_storage_size),
            use_recorded_voice: update.use_recorded_voice.unwrap_or(self.use_recorded_voice),
        }
    }
}

/// Partial settings update, `None` leaves a field unchanged
///
/// `max_storage_size: Some(None)` clears the quota.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub auto_save_enabled: Option<bool>,
    pub minimum_accuracy: Option<u8>,
    pub max_storage_days: Option<u32>,
    pub max_storage_size: Option<Option<u64>>,
    pub use_recorded_voice: Option<bool>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        *self == SettingsUpdate::default()
    }
}

/// Reads and writes the settings document
pub struct SettingsStore {
    pool: SqlitePool,
    defaults: ArchiveSettings,
    write_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(pool: SqlitePool, defaults: ArchiveSettings) -> Self {
        Self {
            pool,
            defaults,
            write_lock: Mutex::new(()),
        }
    }

    /// Persisted settings, or the defaults when missing or unreadable
    pub async fn get(&self) -> ArchiveSettings {
        let raw = match db::query_metadata(&self.pool, SETTINGS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return self.defaults.clone(),
            Err(e) => {
                log::warn!("Failed to read archive settings, using defaults: {}", e);
                return self.defaults.clone();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Stored archive settings are corrupt, using defaults: {}", e);
                self.defaults.clone()
            }
        }
    }

    /// Write the defaults if nothing has been persisted yet
    pub async fn ensure_persisted(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let existing = db::query_metadata(&self.pool, SETTINGS_KEY)
            .await
            .map_err(|source| ArchiveError::Persist {
                what: "settings",
                source,
            })?;
        if existing.is_none() {
            self.write(&self.defaults).await?;
        }
        Ok(())
    }

    /// Merge `update` over the current settings and persist the result
    ///
    /// On failure the stored document is unchanged.
    pub async fn update(&self, update: &SettingsUpdate) -> Result<ArchiveSettings> {
        let _guard = self.write_lock.lock().await;
        let merged = self.get().await.merged(update);
        merged.validate().map_err(ArchiveError::InvalidInput)?;
        self.write(&merged).await?;
        log::info!("Archive settings updated: {:?}", merged);
        Ok(merged)
    }

    async fn write(&self, settings: &ArchiveSettings) -> Result<()> {
        let json = serde_json::to_string(settings).map_err(|e| ArchiveError::Persist {
            what: "settings",
            source: e.into(),
        })?;
        db::upsert_metadata(&self.pool, SETTINGS_KEY, &json)
            .await
            .map_err(|source| ArchiveError::Persist {
                what: "settings",
                source,
            })
    }
}
