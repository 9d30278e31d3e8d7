pub mod loader;
pub mod modules;
pub mod routes;
pub mod types;

pub use loader::*;
pub use modules::{builtin_default_modules, load_default_modules};
pub use routes::{load_route, route_name};
pub use types::*;

use self::types as cfg;

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_logging_level() -> String {
    "info".to_string()
}

pub(crate) fn default_logging_profile() -> cfg::LoggingProfile {
    cfg::LoggingProfile::Lean
}

pub(crate) fn default_timezone_offset_hours() -> i8 {
    0
}

pub(crate) fn default_routes_dir() -> String {
    "routes".to_string()
}

pub(crate) fn default_wallets_file() -> String {
    "wallets.yaml".to_string()
}

pub(crate) fn default_snapshot_dir() -> String {
    ".waypoint".to_string()
}

pub(crate) fn default_max_parallel_wallets() -> usize {
    1
}

pub(crate) fn default_prometheus_listen() -> String {
    "0.0.0.0:9898".to_string()
}

impl Default for cfg::AppConfig {
    fn default() -> Self {
        Self {
            global: cfg::GlobalConfig::default(),
            planner: cfg::PlannerConfig::default(),
            execution: cfg::ExecutionConfig::default(),
        }
    }
}

impl Default for cfg::GlobalConfig {
    fn default() -> Self {
        Self {
            logging: cfg::LoggingConfig::default(),
            paths: cfg::PathsConfig::default(),
        }
    }
}

impl Default for cfg::LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_logging_level(),
            json: false,
            profile: default_logging_profile(),
            timezone_offset_hours: default_timezone_offset_hours(),
        }
    }
}

impl Default for cfg::PathsConfig {
    fn default() -> Self {
        Self {
            default_modules: None,
            routes_dir: default_routes_dir(),
            wallets: default_wallets_file(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

impl Default for cfg::PlannerConfig {
    fn default() -> Self {
        Self {
            shuffle_modules: default_true(),
            seed: None,
        }
    }
}

impl Default for cfg::ExecutionConfig {
    fn default() -> Self {
        Self {
            max_parallel_wallets: default_max_parallel_wallets(),
            shuffle_wallets: false,
            prometheus: cfg::PrometheusConfig::default(),
        }
    }
}

impl Default for cfg::PrometheusConfig {
    fn default() -> Self {
        Self {
            enable: false,
            listen: default_prometheus_listen(),
        }
    }
}

impl cfg::PlannerConfig {
    pub fn plan_options(&self) -> crate::planner::PlanOptions {
        crate::planner::PlanOptions {
            shuffle_modules: self.shuffle_modules,
        }
    }
}
