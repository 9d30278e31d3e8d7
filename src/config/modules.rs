use std::path::Path;

use tracing::info;

use super::loader::{ConfigError, read_document};
use crate::planner::DefaultModuleConfigs;

const BUILTIN_DEFAULT_MODULES: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/default_modules.yaml"));

/// 内置的默认模块配置。
pub fn builtin_default_modules() -> Result<DefaultModuleConfigs, ConfigError> {
    let defaults: DefaultModuleConfigs =
        serde_yaml::from_str(BUILTIN_DEFAULT_MODULES).map_err(|err| ConfigError::Parse {
            path: "default_modules.yaml".into(),
            message: err.to_string(),
        })?;
    ensure_complete(&defaults)?;
    Ok(defaults)
}

/// 读取用户默认模块配置并逐字段覆盖内置值。用户文件只能引用已知模块。
pub fn load_default_modules(path: Option<&Path>) -> Result<DefaultModuleConfigs, ConfigError> {
    let builtin = builtin_default_modules()?;
    let Some(path) = path else {
        return Ok(builtin);
    };

    let user: DefaultModuleConfigs = read_document(path)?;
    if let Some(unknown) = user.kinds().find(|kind| !kind.is_known()) {
        return Err(ConfigError::Invalid(format!(
            "unknown module `{unknown}` in {}",
            path.display()
        )));
    }

    let overridden = user.len();
    let merged = builtin.layered(user);
    ensure_complete(&merged)?;
    info!(
        target: "config",
        path = %path.display(),
        overridden,
        "已加载自定义默认模块配置"
    );
    Ok(merged)
}

fn ensure_complete(defaults: &DefaultModuleConfigs) -> Result<(), ConfigError> {
    for kind in defaults.kinds() {
        let entry = defaults.get(kind);
        if entry.count.is_none() || entry.index_group.is_none() {
            return Err(ConfigError::Invalid(format!(
                "default config for `{kind}` must define count and index_group"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{CountRange, ModuleKind, NumberRange};
    use std::fs;

    #[test]
    fn builtin_defaults_cover_every_known_module() {
        let defaults = builtin_default_modules().unwrap();
        for kind in ModuleKind::KNOWN {
            assert!(defaults.contains(kind), "missing defaults for {kind}");
        }
        let swap = defaults.get(&ModuleKind::SyncSwap);
        assert_eq!(swap.min_and_max_amount, Some(NumberRange::new(60.0, 70.0).unwrap()));
        assert_eq!(swap.dest_tokens.as_deref(), Some(&["USDC".to_string(), "USDT".to_string()][..]));
        let top_up = defaults.get(&ModuleKind::TopUpEthMainnet);
        assert_eq!(top_up.extra.get("reserve_percent_network_fee"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn user_defaults_override_field_by_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.yaml");
        fs::write(&path, "sync-swap:\n  count: [2, 3]\n").unwrap();

        let defaults = load_default_modules(Some(&path)).unwrap();
        let swap = defaults.get(&ModuleKind::SyncSwap);
        assert_eq!(swap.count, Some(CountRange::new(2, 3).unwrap()));
        assert_eq!(swap.src_token.as_deref(), Some("ETH"));
    }

    #[test]
    fn unknown_module_in_user_defaults_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.yaml");
        fs::write(&path, "made-up-swap:\n  count: [1, 1]\n  index_group: 0\n").unwrap();
        assert!(matches!(
            load_default_modules(Some(&path)),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_path_returns_builtin() {
        let defaults = load_default_modules(None).unwrap();
        assert_eq!(defaults.len(), ModuleKind::KNOWN.len());
    }
}
