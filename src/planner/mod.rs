//! 模块计划构建：合并默认配置、拆分次数、分组排序、截断、展开代币对。

use std::collections::BTreeMap;

pub mod error;
pub mod expand;
pub mod kind;
pub mod merge;
pub mod module;
pub mod order;
pub mod overrides;
pub mod range;
pub mod route;
pub mod sampler;
pub mod split;
pub mod truncate;

pub use error::{PlanError, PlanResult};
pub use kind::{Exchange, ModuleFamily, ModuleKind};
pub use module::{
    ModuleBase, ModuleConfig, ModuleSettings, ResolvedAmount, TradeSettings,
    TransformedModuleConfig,
};
pub use overrides::{ModuleOverrides, TokenPair};
pub use range::{CountRange, NumberRange, RangeError};
pub use route::{DefaultModuleConfigs, RouteModule, RouteSettings};
pub use sampler::{RandomSampler, Sampler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOptions {
    /// 是否在同一 `index_group` 内打乱模块顺序。
    pub shuffle_modules: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            shuffle_modules: true,
        }
    }
}

/// 将路线配置转换为有序的调用列表。每次调用只使用自身的输入副本与采样器，
/// 可以针对每个钱包独立调用。
#[derive(Debug, Clone)]
pub struct PlanBuilder<'a> {
    defaults: &'a DefaultModuleConfigs,
    options: PlanOptions,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(defaults: &'a DefaultModuleConfigs, options: PlanOptions) -> Self {
        Self { defaults, options }
    }

    pub fn options(&self) -> PlanOptions {
        self.options
    }

    /// 合并、拆分、分组排序、截断。
    pub fn prepare_modules<S: Sampler + ?Sized>(
        &self,
        route: &RouteSettings,
        sampler: &mut S,
    ) -> PlanResult<Vec<ModuleConfig>> {
        let mut modules = merge::merge_modules(&route.modules, self.defaults)?;

        if route.split_module_count {
            modules = split::split_module_count(modules, sampler);
        }

        modules = order::order_modules(
            modules,
            self.options.shuffle_modules,
            &route.group_settings,
            sampler,
        );

        Ok(truncate::truncate_plan(
            modules,
            route.count_modules,
            sampler,
        ))
    }

    /// 完整计划：在 [`Self::prepare_modules`] 的基础上逐个展开模块。
    pub fn build<S: Sampler + ?Sized>(
        &self,
        route: &RouteSettings,
        sampler: &mut S,
    ) -> PlanResult<Vec<TransformedModuleConfig>> {
        let prepared = self.prepare_modules(route, sampler)?;
        let mut plan = Vec::with_capacity(prepared.len());
        for module in prepared {
            plan.extend(expand::expand_module(module, sampler));
        }
        Ok(plan)
    }
}

/// 计划概览，用于日志与 CLI 输出。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub invocations: usize,
    pub transactions: u64,
    pub reverse_legs: usize,
    pub per_module: BTreeMap<String, usize>,
}

impl PlanSummary {
    pub fn from_plan(plan: &[TransformedModuleConfig]) -> Self {
        let mut summary = PlanSummary {
            invocations: plan.len(),
            ..PlanSummary::default()
        };
        for invocation in plan {
            summary.transactions += u64::from(invocation.count);
            if invocation.is_reverse {
                summary.reverse_legs += 1;
            }
            *summary
                .per_module
                .entry(invocation.module_name.to_string())
                .or_default() += 1;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::sampler::stub::ScriptedSampler;

    fn defaults() -> DefaultModuleConfigs {
        serde_yaml::from_str(
            r#"
okx-withdraw:
  count: [1, 1]
  index_group: 0
  okx_withdraw_network: zkSync
sync-swap:
  count: [1, 1]
  index_group: 1
  pairs: [ETH, USDC]
  min_and_max_amount: [70, 80]
  use_percent_balance: true
izumi-swap:
  count: [1, 1]
  index_group: 1
  src_token: ETH
  dest_tokens: [USDC]
balance-checker:
  count: [1, 1]
  index_group: 2
"#,
        )
        .unwrap()
    }

    #[test]
    fn build_runs_every_stage_in_order() {
        let route: RouteSettings = serde_yaml::from_str(
            r#"
modules:
  - module_name: balance-checker
  - module_name: sync-swap
    reverse: true
    count: [2, 2]
  - module_name: okx-withdraw
  - module_name: izumi-swap
count_modules: [0, 0]
"#,
        )
        .unwrap();
        let defaults = defaults();
        let builder = PlanBuilder::new(
            &defaults,
            PlanOptions {
                shuffle_modules: false,
            },
        );

        let plan = builder
            .build(&route, &mut ScriptedSampler::lowest())
            .unwrap();
        let labels: Vec<String> = plan.iter().map(|m| m.describe()).collect();
        assert_eq!(
            labels,
            vec![
                "okx-withdraw @zkSync",
                "sync-swap ETH->USDC",
                "sync-swap USDC->ETH (reverse)",
                "sync-swap ETH->USDC",
                "sync-swap USDC->ETH (reverse)",
                "izumi-swap ETH->USDC",
                "balance-checker",
            ]
        );

        let summary = PlanSummary::from_plan(&plan);
        assert_eq!(summary.invocations, 7);
        assert_eq!(summary.reverse_legs, 2);
        assert_eq!(summary.per_module.get("sync-swap"), Some(&4));
    }

    #[test]
    fn split_then_truncate_caps_total() {
        let route: RouteSettings = serde_yaml::from_str(
            r#"
modules:
  - module_name: balance-checker
    count: [4, 4]
split_module_count: true
count_modules: [3, 3]
"#,
        )
        .unwrap();
        let defaults = defaults();
        let builder = PlanBuilder::new(&defaults, PlanOptions::default());
        let prepared = builder
            .prepare_modules(&route, &mut RandomSampler::seeded(9))
            .unwrap();
        assert_eq!(prepared.len(), 3);
        assert!(prepared.iter().all(|m| m.count == CountRange::once()));
        assert!(
            prepared
                .iter()
                .all(|m| m.original_count == Some(CountRange::fixed(4)))
        );
    }

    #[test]
    fn missing_required_field_surfaces_as_error() {
        let route: RouteSettings =
            serde_yaml::from_str("modules:\n  - module_name: unknown-step\n").unwrap();
        let defaults = defaults();
        let builder = PlanBuilder::new(&defaults, PlanOptions::default());
        let err = builder
            .build(&route, &mut RandomSampler::seeded(1))
            .unwrap_err();
        assert!(matches!(err, PlanError::MissingField { .. }));
    }
}
