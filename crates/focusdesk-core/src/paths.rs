//! Standard paths used by focusdesk

use std::path::{Path, PathBuf};

/// Standard focusdesk paths
#[derive(Debug, Clone)]
pub struct Paths {
    /// Data directory (~/.local/share/focusdesk)
    pub data: PathBuf,
    /// Config directory (~/.config/focusdesk)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("focusdesk");

        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("focusdesk");

        Self { data, config }
    }

    /// Paths rooted somewhere else (tests, `--data-dir`)
    pub fn with_data_dir(mut self, data: &Path) -> Self {
        self.data = data.to_path_buf();
        self
    }

    /// Config file location
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.json")
    }

    /// Directory holding the persisted key/value blobs
    pub fn storage(&self) -> PathBuf {
        self.data.join("storage")
    }

    /// Log file used while the dashboard owns the terminal
    pub fn log_file(&self) -> PathBuf {
        self.data.join("focusdesk.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_override() {
        let paths = Paths::new().with_data_dir(Path::new("/tmp/fd"));
        assert_eq!(paths.storage(), PathBuf::from("/tmp/fd/storage"));
        assert_eq!(paths.log_file(), PathBuf::from("/tmp/fd/focusdesk.log"));
    }

    #[test]
    fn test_config_file_name() {
        let paths = Paths::new();
        assert!(paths.config_file().ends_with("focusdesk/config.json"));
    }
}
