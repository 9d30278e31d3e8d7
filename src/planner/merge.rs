use tracing::debug;

use super::error::PlanResult;
use super::module::ModuleConfig;
use super::route::{DefaultModuleConfigs, RouteModule};

/// 逐条合并路线模块与默认配置，输出与输入等长且顺序一致。
///
/// 优先级从低到高：模块类型默认值、路线覆盖项。`delay` 单独解析：路线优先，其次默认值。
pub fn merge_modules(
    modules: &[RouteModule],
    defaults: &DefaultModuleConfigs,
) -> PlanResult<Vec<ModuleConfig>> {
    modules
        .iter()
        .map(|entry| merge_module(entry, defaults))
        .collect()
}

pub fn merge_module(
    entry: &RouteModule,
    defaults: &DefaultModuleConfigs,
) -> PlanResult<ModuleConfig> {
    let mut default_config = defaults.get(&entry.module_name);
    if default_config.is_empty() {
        debug!(
            target: "planner::merge",
            module = %entry.module_name,
            "模块没有默认配置，仅使用路线中的字段"
        );
    }

    let mut overrides = entry.overrides.clone();
    let delay = overrides.delay.take().or(default_config.delay.take());

    let mut merged = default_config.overlay(overrides);
    merged.delay = delay;

    ModuleConfig::resolve(entry.module_name.clone(), merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::kind::ModuleKind;
    use crate::planner::module::ModuleSettings;
    use crate::planner::range::{CountRange, NumberRange};

    fn defaults(yaml: &str) -> DefaultModuleConfigs {
        serde_yaml::from_str(yaml).expect("parse defaults")
    }

    fn route(yaml: &str) -> Vec<RouteModule> {
        serde_yaml::from_str(yaml).expect("parse route modules")
    }

    #[test]
    fn merge_overlays_route_fields_on_defaults() {
        let defaults = defaults("x:\n  count: [1, 1]\n  index_group: 0\n");
        let modules = route("- module_name: x\n  network: bsc\n");

        let merged = merge_modules(&modules, &defaults).unwrap();
        assert_eq!(merged.len(), 1);
        let module = &merged[0];
        assert_eq!(module.module_name, ModuleKind::Other("x".to_string()));
        assert_eq!(module.count, CountRange::once());
        assert_eq!(module.base.index_group, 0);
        assert_eq!(module.settings.network(), Some("bsc"));
    }

    #[test]
    fn merge_preserves_length_and_order() {
        let defaults = defaults(
            "sync-swap:\n  count: [1, 1]\n  index_group: 2\n\
             okx-withdraw:\n  count: [1, 1]\n  index_group: 0\n",
        );
        let modules = route(
            "- module_name: sync-swap\n\
             - module_name: okx-withdraw\n\
             - module_name: sync-swap\n  index_group: 5\n\
             - module_name: okx-withdraw\n",
        );

        let merged = merge_modules(&modules, &defaults).unwrap();
        let names: Vec<_> = merged.iter().map(|m| m.module_name.clone()).collect();
        assert_eq!(
            names,
            vec![
                ModuleKind::SyncSwap,
                ModuleKind::OkxWithdraw,
                ModuleKind::SyncSwap,
                ModuleKind::OkxWithdraw
            ]
        );
        let groups: Vec<_> = merged.iter().map(|m| m.base.index_group).collect();
        assert_eq!(groups, vec![2, 0, 5, 0]);
    }

    #[test]
    fn route_delay_wins_over_default_delay() {
        let defaults = defaults("sync-swap:\n  count: [1, 1]\n  index_group: 0\n  delay: [0, 0]\n");
        let modules = route(
            "- module_name: sync-swap\n  delay: [30, 60]\n\
             - module_name: sync-swap\n",
        );
        let merged = merge_modules(&modules, &defaults).unwrap();
        assert_eq!(merged[0].base.delay, NumberRange::new(30.0, 60.0).unwrap());
        assert_eq!(merged[1].base.delay, NumberRange::zero());
    }

    #[test]
    fn unknown_module_uses_only_route_fields() {
        let modules = route("- module_name: brand-new\n  count: [2, 2]\n  index_group: 4\n");
        let merged = merge_modules(&modules, &DefaultModuleConfigs::default()).unwrap();
        assert_eq!(merged[0].count, CountRange::fixed(2));
        assert!(matches!(merged[0].settings, ModuleSettings::Custom(_)));
    }

    #[test]
    fn unknown_module_without_count_is_reported() {
        let modules = route("- module_name: brand-new\n");
        assert!(merge_modules(&modules, &DefaultModuleConfigs::default()).is_err());
    }
}
