use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::AppConfig;

pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "waypoint.yaml",
    "config/waypoint.yaml",
    "waypoint.toml",
    "config/waypoint.toml",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// 主配置及其来源文件，来源目录用于解析其余相对路径。
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
}

impl LoadedConfig {
    pub fn base_dir(&self) -> PathBuf {
        self.source
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// 绝对路径原样返回，相对路径拼接到主配置所在目录。
    pub fn resolve(&self, value: &str) -> PathBuf {
        let path = PathBuf::from(value);
        if path.is_absolute() {
            path
        } else {
            self.base_dir().join(path)
        }
    }
}

pub fn load_config(path: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
    let explicit = path.is_some();
    let candidate_paths = match path {
        Some(p) => vec![p],
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .collect::<Vec<PathBuf>>(),
    };

    for candidate in candidate_paths {
        if let Some(config) = try_load_file(&candidate)? {
            validate(&config)?;
            return Ok(LoadedConfig {
                config,
                source: Some(candidate),
            });
        }
        if explicit {
            return Err(ConfigError::Io {
                path: candidate,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
    }

    debug!(target: "config", "未找到配置文件，使用默认配置");
    Ok(LoadedConfig::default())
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if config.execution.max_parallel_wallets == 0 {
        return Err(ConfigError::Invalid(
            "execution.max_parallel_wallets must be at least 1".to_string(),
        ));
    }
    if !(-12..=14).contains(&config.global.logging.timezone_offset_hours) {
        return Err(ConfigError::Invalid(format!(
            "global.logging.timezone_offset_hours out of range: {}",
            config.global.logging.timezone_offset_hours
        )));
    }
    Ok(())
}

fn try_load_file(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    read_document(path).map(Some)
}

/// 按扩展名选择解析器：`.toml` 使用 TOML，其余按 YAML 解析。
pub(crate) fn read_document<T>(path: &Path) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        toml::from_str(&contents).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    } else {
        serde_yaml::from_str(&contents).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}
