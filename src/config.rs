use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::bank::{BankSource, DEFAULT_BUNDLED_BANK};
use crate::export::ExportFormat;

pub const DEFAULT_TICK_RATE_MS: u64 = 250;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Question bank file; wins over `bundled_bank` when set
    pub bank: Option<PathBuf>,
    pub bundled_bank: String,
    pub shuffle: bool,
    pub export_format: ExportFormat,
    pub export_dir: Option<PathBuf>,
    pub tick_rate_ms: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bank: None,
            bundled_bank: DEFAULT_BUNDLED_BANK.to_string(),
            shuffle: false,
            export_format: ExportFormat::Text,
            export_dir: None,
            tick_rate_ms: DEFAULT_TICK_RATE_MS,
            log_level: "info".to_string(),
        }
    }
}

/// Command-line values layered over the stored config
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub bank: Option<PathBuf>,
    pub bundled_bank: Option<String>,
    pub shuffle: bool,
    pub export_format: Option<ExportFormat>,
    pub export_dir: Option<PathBuf>,
    pub tick_rate_ms: Option<u64>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn with_overrides(mut self, o: &Overrides) -> Self {
        if let Some(name) = &o.bundled_bank {
            // an explicit bundled choice replaces a stored file path
            self.bundled_bank = name.clone();
            self.bank = None;
        }
        if let Some(path) = &o.bank {
            self.bank = Some(path.clone());
        }
        self.shuffle |= o.shuffle;
        if let Some(format) = o.export_format {
            self.export_format = format;
        }
        if let Some(dir) = &o.export_dir {
            self.export_dir = Some(dir.clone());
        }
        if let Some(ms) = o.tick_rate_ms {
            self.tick_rate_ms = ms;
        }
        if let Some(level) = &o.log_level {
            self.log_level = level.clone();
        }
        self
    }

    pub fn bank_source(&self) -> BankSource {
        match &self.bank {
            Some(path) => BankSource::File(path.clone()),
            None => BankSource::Bundled(self.bundled_bank.clone()),
        }
    }

    pub fn resolved_export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(AppDirs::export_dir)
    }

    /// Never ticks faster than every 50ms
    pub fn tick_rate_ms(&self) -> u64 {
        self.tick_rate_ms.max(50)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), "ignoring unreadable config: {e}")
                }
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
