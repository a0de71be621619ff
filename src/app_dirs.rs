use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("studytrack"),
            )
        } else {
            ProjectDirs::from("", "", "studytrack")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    /// File backing the client-local key/value store (timer start, visibility flag).
    pub fn local_store_path() -> PathBuf {
        Self::state_dir()
            .map(|d| d.join("local.json"))
            .unwrap_or_else(|| PathBuf::from("studytrack_local.json"))
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|d| d.join("studytrack.log"))
            .unwrap_or_else(|| PathBuf::from("studytrack.log"))
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "studytrack")
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("studytrack_config.json"))
    }
}
