use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "quizr")
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("quizr_config.json"))
    }

    /// `$HOME/.local/state/quizr`, falling back to the platform data dir
    pub fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("quizr")
        } else {
            Self::project()
                .map(|pd| pd.data_local_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        }
    }

    pub fn log_dir() -> PathBuf {
        Self::state_dir().join("logs")
    }

    pub fn export_dir() -> PathBuf {
        Self::state_dir().join("exports")
    }
}
