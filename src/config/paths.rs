use std::path::PathBuf;

use super::error::ConfigError;

const APP_DIR: &str = "llm-bench";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl ConfigPaths {
    /// Default locations under the home directory, or `config_override` for
    /// the config file itself.
    pub fn resolve(config_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        let data_dir = default_data_dir()?;
        let logs_dir = data_dir.join("logs");
        if let Some(path) = config_override {
            let config_dir = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            return Ok(Self {
                config_file: path,
                config_dir,
                data_dir,
                logs_dir,
            });
        }
        let config_dir = default_config_dir()?;
        Ok(Self {
            config_file: config_dir.join(CONFIG_FILE),
            config_dir,
            data_dir,
            logs_dir,
        })
    }

    pub fn default_log_file(&self) -> PathBuf {
        self.logs_dir.join(format!("{APP_DIR}.log"))
    }
}

fn default_config_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::MissingHome)?;
    Ok(home.join(".config").join(APP_DIR))
}

fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::MissingHome)?;
    Ok(home.join(".local").join("share").join(APP_DIR))
}
