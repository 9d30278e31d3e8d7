use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use time::{UtcOffset, macros::format_description};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{
    LoadedConfig, LoggingConfig, LoggingProfile, load_default_modules, load_route, route_name,
};
use crate::planner::{DefaultModuleConfigs, PlanBuilder, RouteSettings};
use crate::wallet::{SnapshotStore, WalletData, load_wallets};

/// 初始化 tracing，兼顾 JSON 与文本输出模式。
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let mut filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if matches!(config.profile, LoggingProfile::Lean) {
        const QUIET_TARGETS: &[(&str, &str)] = &[
            ("hyper", "warn"),
            ("metrics_exporter_prometheus", "info"),
            ("planner", "info"),
            ("wallet::snapshot", "info"),
        ];
        for (module, level) in QUIET_TARGETS {
            if !config.level.contains(module) {
                if let Ok(directive) = format!("{module}={level}").parse() {
                    filter = filter.add_directive(directive);
                }
            }
        }
    }

    if matches!(config.profile, LoggingProfile::Verbose) {
        const VERBOSE_TARGETS: &[(&str, &str)] = &[
            ("planner::merge", "debug"),
            ("planner::order", "debug"),
            ("planner::expand", "trace"),
            ("execution::wallet", "debug"),
            ("wallet::snapshot", "debug"),
        ];
        for (module, level) in VERBOSE_TARGETS {
            if let Ok(directive) = format!("{module}={level}").parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    let time_format =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");
    let offset = UtcOffset::from_hms(config.timezone_offset_hours, 0, 0).map_err(|err| {
        anyhow!(
            "invalid logging timezone offset {}: {err}",
            config.timezone_offset_hours
        )
    })?;
    let offset_timer = OffsetTime::new(offset, time_format);

    let base = fmt()
        .with_timer(offset_timer)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true)
        .with_level(true);

    if config.json {
        base.json()
            .with_current_span(false)
            .with_span_list(false)
            .with_env_filter(filter)
            .try_init()
            .map_err(|err| anyhow!(err.to_string()))?;
    } else {
        base.with_env_filter(filter)
            .event_format(fmt::format().compact())
            .try_init()
            .map_err(|err| anyhow!(err.to_string()))?;
    }
    Ok(())
}

/// 一次命令运行所需的已解析输入。
pub struct RunContext {
    pub loaded: LoadedConfig,
    pub defaults: DefaultModuleConfigs,
}

impl RunContext {
    pub fn new(loaded: LoadedConfig) -> Result<Self> {
        let defaults_path = loaded
            .config
            .global
            .paths
            .default_modules
            .as_deref()
            .map(|value| loaded.resolve(value));
        let defaults = load_default_modules(defaults_path.as_deref())
            .context("加载默认模块配置失败")?;
        Ok(Self { loaded, defaults })
    }

    pub fn builder(&self) -> PlanBuilder<'_> {
        PlanBuilder::new(&self.defaults, self.loaded.config.planner.plan_options())
    }

    pub fn route(&self, name: &str) -> Result<RouteSettings> {
        let routes_dir = self.loaded.resolve(&self.loaded.config.global.paths.routes_dir);
        load_route(&routes_dir, name).with_context(|| format!("加载路线 {name} 失败"))
    }

    pub fn wallets(&self) -> Result<Vec<WalletData>> {
        let path = self.loaded.resolve(&self.loaded.config.global.paths.wallets);
        load_wallets(&path).context("加载钱包列表失败")
    }

    pub fn snapshot_store(&self) -> SnapshotStore {
        SnapshotStore::new(self.loaded.resolve(&self.loaded.config.global.paths.snapshot_dir))
    }

    pub fn route_key(&self, name: &str) -> String {
        route_name(name)
    }
}

pub fn init_configs(args: crate::cli::args::InitCmd) -> Result<()> {
    let output_dir = match args.output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    fs::create_dir_all(output_dir.join("routes"))?;

    let templates: [(&str, &str); 4] = [
        (
            "waypoint.yaml",
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/waypoint.yaml")),
        ),
        (
            "default_modules.yaml",
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/default_modules.yaml")),
        ),
        (
            "wallets.yaml",
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/wallets.example.yaml")),
        ),
        (
            "routes/example.yaml",
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/routes/example.yaml")),
        ),
    ];

    for (filename, contents) in templates {
        let target_path: PathBuf = output_dir.join(filename);
        if target_path.exists() && !args.force {
            println!(
                "跳过 {}（文件已存在，如需覆盖请加 --force）",
                target_path.display()
            );
            continue;
        }

        fs::write(&target_path, contents)?;
        println!("已写入 {}", target_path.display());
    }

    Ok(())
}
