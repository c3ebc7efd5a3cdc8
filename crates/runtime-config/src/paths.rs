use crate::{CONFIG_FILE_NAME, ConfigError};
use std::path::{Path, PathBuf};

/// Data directory name under the user's home.
pub const DATA_DIR_NAME: &str = ".webhook-tui";
pub const DB_FILE_NAME: &str = "webhooks.db";
pub const LOG_FILE_NAME: &str = "webhook-tui.log";

fn home_dir() -> Result<PathBuf, ConfigError> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .map_err(|_| ConfigError::HomeUnavailable)
}

/// `~/.webhook-tui`
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    Ok(data_dir_in(&home_dir()?))
}

/// `~/.webhook-tui/webhooks.db`
pub fn db_path() -> Result<PathBuf, ConfigError> {
    Ok(data_dir()?.join(DB_FILE_NAME))
}

/// `~/.webhook-tui/config.toml`
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(data_dir()?.join(CONFIG_FILE_NAME))
}

/// `~/.webhook-tui/webhook-tui.log`
pub fn log_path() -> Result<PathBuf, ConfigError> {
    Ok(data_dir()?.join(LOG_FILE_NAME))
}

pub fn data_dir_in(home: &Path) -> PathBuf {
    home.join(DATA_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_is_hidden_folder_under_home() {
        let dir = data_dir_in(Path::new("/home/alice"));
        assert_eq!(dir, PathBuf::from("/home/alice/.webhook-tui"));
    }

    #[test]
    fn file_paths_share_the_data_dir() {
        let Ok(dir) = data_dir() else {
            return;
        };
        assert_eq!(db_path().unwrap(), dir.join("webhooks.db"));
        assert_eq!(config_path().unwrap(), dir.join("config.toml"));
        assert_eq!(log_path().unwrap(), dir.join("webhook-tui.log"));
    }
}
