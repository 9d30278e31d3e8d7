use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoggingProfile {
    Lean,
    Verbose,
}

impl Default for LoggingProfile {
    fn default() -> Self {
        Self::Lean
    }
}

impl LoggingProfile {
    pub fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "super::default_logging_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default = "super::default_logging_profile")]
    pub profile: LoggingProfile,
    #[serde(default = "super::default_timezone_offset_hours")]
    pub timezone_offset_hours: i8,
}

/// 相对路径以主配置文件所在目录为基准解析。
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// 用户自定义的默认模块配置，覆盖内置默认值；为空时只用内置值。
    #[serde(default)]
    pub default_modules: Option<String>,
    #[serde(default = "super::default_routes_dir")]
    pub routes_dir: String,
    #[serde(default = "super::default_wallets_file")]
    pub wallets: String,
    #[serde(default = "super::default_snapshot_dir")]
    pub snapshot_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "super::default_true")]
    pub shuffle_modules: bool,
    /// 固定种子后同一路线、同一钱包列表得到相同的计划。
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "super::default_max_parallel_wallets")]
    pub max_parallel_wallets: usize,
    #[serde(default)]
    pub shuffle_wallets: bool,
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrometheusConfig {
    #[serde(default)]
    pub enable: bool,
    #[serde(default = "super::default_prometheus_listen")]
    pub listen: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("parse yaml");
        assert_eq!(config.global.logging.level, "info");
        assert!(config.planner.shuffle_modules);
        assert_eq!(config.planner.seed, None);
        assert_eq!(config.execution.max_parallel_wallets, 1);
        assert_eq!(config.global.paths.routes_dir, "routes");
        assert!(!config.execution.prometheus.enable);
    }

    #[test]
    fn nested_sections_parse_from_yaml() {
        let yaml = "global:\n  logging:\n    level: debug\n    profile: verbose\n\
                    planner:\n  shuffle_modules: false\n  seed: 42\n\
                    execution:\n  max_parallel_wallets: 4\n  shuffle_wallets: true\n";
        let config: AppConfig = serde_yaml::from_str(yaml).expect("parse yaml");
        assert!(config.global.logging.profile.is_verbose());
        assert!(!config.planner.shuffle_modules);
        assert_eq!(config.planner.seed, Some(42));
        assert_eq!(config.execution.max_parallel_wallets, 4);
        assert!(config.execution.shuffle_wallets);
    }

    #[test]
    fn toml_is_accepted_as_well() {
        let toml_src = "[planner]\nseed = 7\n\n[execution]\nmax_parallel_wallets = 2\n";
        let config: AppConfig = toml::from_str(toml_src).expect("parse toml");
        assert_eq!(config.planner.seed, Some(7));
        assert_eq!(config.execution.max_parallel_wallets, 2);
    }
}
