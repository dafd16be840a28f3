use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_DATABASE_FILE, DEFAULT_RECORDINGS_DIR};
use crate::error::DynError;
use crate::settings::{ArchiveSettings, SettingsUpdate};

/// Archive location configuration file structure
///
/// ```toml
/// data_dir = "/var/lib/verse/archive"
/// # database_file = "voice_archive.sqlite"
/// # recordings_dir = "recordings"
///
/// [settings]
/// minimum_accuracy = 85
/// max_storage_size_mb = 200
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Base directory for the database and the recordings directory (required)
    pub data_dir: PathBuf,
    /// Database file, relative paths resolve against data_dir (default: voice_archive.sqlite)
    pub database_file: Option<PathBuf>,
    /// Managed recordings directory, relative paths resolve against data_dir (default: recordings)
    pub recordings_dir: Option<PathBuf>,
    /// Settings used until the first update is persisted
    #[serde(default)]
    pub settings: InitialSettings,
}

/// Overrides for the built-in setting defaults (maps to [settings] section in TOML)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitialSettings {
    pub auto_save_enabled: Option<bool>,
    pub minimum_accuracy: Option<u8>,
    pub max_storage_days: Option<u32>,
    pub max_storage_size_mb: Option<u64>,
    pub use_recorded_voice: Option<bool>,
}

impl ArchiveConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            database_file: None,
            recordings_dir: None,
            settings: InitialSettings::default(),
        }
    }

    /// Load a configuration file (TOML format)
    pub fn load(path: &Path) -> Result<Self, DynError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: ArchiveConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    fn resolve(&self, path: Option<&PathBuf>, default: &str) -> PathBuf {
        match path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => self.data_dir.join(p),
            None => self.data_dir.join(default),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.resolve(self.database_file.as_ref(), DEFAULT_DATABASE_FILE)
    }

    pub fn recordings_path(&self) -> PathBuf {
        self.resolve(self.recordings_dir.as_ref(), DEFAULT_RECORDINGS_DIR)
    }

    /// Built-in defaults with the [settings] overrides applied
    pub fn default_settings(&self) -> ArchiveSettings {
        let s = &self.settings;
        ArchiveSettings::default().merged(&SettingsUpdate {
            auto_save_enabled: s.auto_save_enabled,
            minimum_accuracy: s.minimum_accuracy,
            max_storage_days: s.max_storage_days,
            max_storage_size: s.max_storage_size_mb.map(Some),
            use_recorded_voice: s.use_recorded_voice,
        })
    }

    /// Validate paths and the initial settings
    ///
    /// The database file and the recordings directory must not be the same path.
    pub fn validate(&self) -> Result<(), String> {
        if self.data_dir.as_os_str().is_empty() {
            return Err("data_dir must not be empty".to_string());
        }
        if self.database_path() == self.recordings_path() {
            return Err(format!(
                "database_file and recordings_dir both resolve to '{}'",
                self.database_path().display()
            ));
        }
        self.default_settings().validate()
    }
}
