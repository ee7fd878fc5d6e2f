use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "tapline";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("tapline_config.json"))
    }

    /// Local record store used when no server is configured.
    pub fn store_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.data_local_dir().join("records.json"))
            .unwrap_or_else(|| PathBuf::from("tapline_records.json"))
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir().join("tapline.log")
    }

    fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|pd| pd.data_local_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_have_expected_file_names() {
        assert!(AppDirs::config_path().ends_with("config.json"));
        assert!(AppDirs::store_path().ends_with("records.json"));
        assert!(AppDirs::log_path().ends_with("tapline.log"));
    }
}
