use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::paths::ConfigPaths;
use super::types::AppConfig;

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub paths: ConfigPaths,
    pub config_exists: bool,
}

/// Reads the config file. A missing file yields the defaults.
pub fn load_config(path_override: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
    let paths = ConfigPaths::resolve(path_override)?;
    let (config, config_exists) = read_config(&paths.config_file)?;
    if config_exists {
        log::debug!("loaded config from {}", paths.config_file.display());
    }
    Ok(LoadedConfig {
        config,
        paths,
        config_exists,
    })
}

fn read_config(path: &Path) -> Result<(AppConfig, bool), ConfigError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok((toml::from_str(&contents)?, true)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok((AppConfig::default(), false)),
        Err(err) => Err(ConfigError::Io(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(dir.path().join("absent.toml"))).unwrap();
        assert!(!loaded.config_exists);
        assert_eq!(loaded.config, AppConfig::default());
        assert_eq!(loaded.paths.config_dir, dir.path());
    }

    #[test]
    fn reads_all_sections() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[bench]
models = ["phi:latest"]
verbose = true
target_process = "ollama_llama_server"

[evaluator]
references_file = "refs.json"

[logging]
level = "debug"
rotate_keep = 2
"#
        )
        .unwrap();

        let loaded = load_config(Some(file.path().to_path_buf())).unwrap();
        let config = loaded.config;
        assert!(loaded.config_exists);
        assert_eq!(config.bench.models, vec!["phi:latest"]);
        assert!(config.bench.verbose);
        assert!(config.bench.track_memory);
        assert_eq!(config.bench.target_process, "ollama_llama_server");
        assert_eq!(
            config.evaluator.references_file,
            Some(PathBuf::from("refs.json"))
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.rotate_keep, 2);
        assert_eq!(config.logging.rotate_size, 10 * 1024 * 1024);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[bench\nmodels = 3").unwrap();
        let err = load_config(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
        assert!(matches!(BenchError::from(err), BenchError::Config(_)));
    }

    #[test]
    fn log_file_lives_in_logs_dir() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::resolve(Some(dir.path().join("c.toml"))).unwrap();
        assert!(paths.default_log_file().ends_with("logs/llm-bench.log"));
    }
}
