use tracing::trace;

use super::module::{
    ModuleConfig, ModuleSettings, ResolvedAmount, TradeSettings, TransformedModuleConfig,
};
use super::overrides::TokenPair;
use super::sampler::{Sampler, pick, sample_count, sample_number};

/// 解析重复次数后展开单个模块。
pub fn expand_module<S: Sampler + ?Sized>(
    module: ModuleConfig,
    sampler: &mut S,
) -> Vec<TransformedModuleConfig> {
    let count = sample_count(sampler, module.count);
    expand_invocation(TransformedModuleConfig::from_config(module, count), sampler)
}

/// 将带代币对的模块展开为 `count` 组正向（及可选反向）调用；
/// 带随机提现网络的模块抽取一个网络；其余模块原样返回。
pub fn expand_invocation<S: Sampler + ?Sized>(
    module: TransformedModuleConfig,
    sampler: &mut S,
) -> Vec<TransformedModuleConfig> {
    if module.count == 0 {
        trace!(
            target: "planner::expand",
            module = %module.module_name,
            "次数为 0，跳过"
        );
        return Vec::new();
    }

    let trade = module
        .settings
        .trade()
        .filter(|trade| trade.is_pair_bearing())
        .cloned();
    if let Some(trade) = trade {
        return expand_pairs(&module, &trade, sampler);
    }

    if let ModuleSettings::Withdraw(withdraw) = &module.settings {
        if let Some(network) = pick(sampler, &withdraw.random_networks).cloned() {
            let mut updated = module;
            if let ModuleSettings::Withdraw(withdraw) = &mut updated.settings {
                trace!(
                    target: "planner::expand",
                    module = %updated.module_name,
                    network = %network,
                    "随机选择提现网络"
                );
                withdraw.network = Some(network);
            }
            return vec![updated];
        }
    }

    vec![module]
}

fn expand_pairs<S: Sampler + ?Sized>(
    module: &TransformedModuleConfig,
    trade: &TradeSettings,
    sampler: &mut S,
) -> Vec<TransformedModuleConfig> {
    let legs_per_repeat = if trade.reverse { 2 } else { 1 };
    let mut expanded = Vec::with_capacity(module.count as usize * legs_per_repeat);

    for _ in 0..module.count {
        let token_pair = match (&trade.pairs, &trade.src_token) {
            (Some(pair), _) => Some(pair.clone()),
            (None, Some(src)) => pick(sampler, &trade.dest_tokens)
                .map(|destination| TokenPair::new(src.clone(), destination.clone())),
            (None, None) => None,
        };
        let contract_pair = trade.contract_pairs.clone();

        let mut forward_trade = trade.clone();
        forward_trade.pairs = token_pair.clone();
        forward_trade.contract_pairs = contract_pair.clone();
        let forward_amount = forward_trade.amount.range.map(|range| ResolvedAmount {
            value: sample_number(sampler, range),
            percent: forward_trade.amount.use_percent_balance,
        });
        expanded.push(leg(module, forward_trade, forward_amount, false));

        if trade.reverse {
            let reverse_range = trade.reverse_amount_or_default();
            let mut reverse_trade = trade.clone();
            reverse_trade.pairs = token_pair.as_ref().map(TokenPair::reversed);
            reverse_trade.contract_pairs = contract_pair.as_ref().map(TokenPair::reversed);
            reverse_trade.amount.range = Some(reverse_range);
            reverse_trade.amount.use_percent_balance = true;
            let reverse_amount = ResolvedAmount {
                value: sample_number(sampler, reverse_range),
                percent: true,
            };
            expanded.push(leg(module, reverse_trade, Some(reverse_amount), true));
        }
    }

    expanded
}

fn leg(
    module: &TransformedModuleConfig,
    trade: TradeSettings,
    amount: Option<ResolvedAmount>,
    is_reverse: bool,
) -> TransformedModuleConfig {
    let mut invocation = module.clone();
    invocation.count = 1;
    invocation.is_reverse = is_reverse;
    invocation.amount = amount;
    if let Some(slot) = invocation.settings.trade_mut() {
        *slot = trade;
    }
    invocation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::kind::ModuleKind;
    use crate::planner::merge::merge_modules;
    use crate::planner::module::DEFAULT_REVERSE_PERCENT;
    use crate::planner::range::NumberRange;
    use crate::planner::route::{DefaultModuleConfigs, RouteModule};
    use crate::planner::sampler::RandomSampler;
    use crate::planner::sampler::stub::{HighestSampler, ScriptedSampler};

    fn resolved(yaml: &str) -> ModuleConfig {
        let route: Vec<RouteModule> = serde_yaml::from_str(yaml).unwrap();
        merge_modules(&route, &DefaultModuleConfigs::default())
            .unwrap()
            .remove(0)
    }

    #[test]
    fn reverse_pairs_expand_to_forward_and_reverse_legs() {
        let module = resolved(
            "- module_name: sync-swap\n  count: [2, 2]\n  index_group: 0\n\
             \x20 pairs: [A, B]\n  reverse: true\n  min_and_max_amount: [0.1, 0.2]\n\
             \x20 use_percent_balance: false\n",
        );
        let output = expand_module(module, &mut ScriptedSampler::lowest());

        assert_eq!(output.len(), 4);
        for (idx, invocation) in output.iter().enumerate() {
            assert_eq!(invocation.count, 1);
            let pair = invocation.pairs().unwrap();
            if idx % 2 == 0 {
                assert!(!invocation.is_reverse);
                assert_eq!(pair, &TokenPair::new("A", "B"));
                let amount = invocation.amount.unwrap();
                assert!(!amount.percent);
                assert_eq!(amount.value, 0.1);
            } else {
                assert!(invocation.is_reverse);
                assert_eq!(pair, &TokenPair::new("B", "A"));
                let trade = invocation.settings.trade().unwrap();
                assert!(trade.amount.use_percent_balance);
                assert_eq!(trade.amount.range, Some(DEFAULT_REVERSE_PERCENT));
                let amount = invocation.amount.unwrap();
                assert!(amount.percent);
                assert_eq!(amount.value, 99.99);
            }
        }
    }

    #[test]
    fn reverse_leg_uses_configured_reverse_range() {
        let module = resolved(
            "- module_name: sync-swap\n  count: [1, 1]\n  index_group: 0\n\
             \x20 contract_pairs: ['0xaa', '0xbb']\n  reverse: true\n\
             \x20 reverse_min_and_max_amount: [50, 60]\n",
        );
        let output = expand_module(module, &mut HighestSampler);
        assert_eq!(output.len(), 2);
        let reverse = &output[1];
        assert_eq!(reverse.contract_pairs(), Some(&TokenPair::new("0xbb", "0xaa")));
        assert_eq!(
            reverse.settings.trade().unwrap().amount.range,
            Some(NumberRange::new(50.0, 60.0).unwrap())
        );
        assert_eq!(reverse.amount.unwrap().value, 60.0);
        // 正向没有金额区间时不生成金额
        assert!(output[0].amount.is_none());
    }

    #[test]
    fn destination_is_drawn_per_repetition() {
        let module = resolved(
            "- module_name: izumi-swap\n  count: [2, 2]\n  index_group: 0\n\
             \x20 src_token: ETH\n  dest_tokens: [USDC, USDT]\n",
        );
        // 第一次选 USDC，第二次选 USDT
        let output = expand_module(module, &mut ScriptedSampler::new([0.0, 0.99]));
        let pairs: Vec<_> = output.iter().map(|m| m.pairs().cloned().unwrap()).collect();
        assert_eq!(
            pairs,
            vec![TokenPair::new("ETH", "USDC"), TokenPair::new("ETH", "USDT")]
        );
    }

    #[test]
    fn zero_count_pair_module_emits_nothing() {
        let module = resolved(
            "- module_name: sync-swap\n  count: [0, 0]\n  index_group: 0\n  pairs: [A, B]\n",
        );
        assert!(expand_module(module, &mut RandomSampler::seeded(1)).is_empty());
    }

    #[test]
    fn zero_count_plain_module_emits_nothing() {
        let module = resolved(
            "- module_name: balance-checker\n  count: [0, 0]\n  index_group: 0\n  network: bsc\n",
        );
        assert!(expand_module(module, &mut RandomSampler::seeded(1)).is_empty());
    }

    #[test]
    fn withdraw_picks_random_network() {
        let module = resolved(
            "- module_name: okx-withdraw\n  count: [1, 1]\n  index_group: 0\n\
             \x20 okx_withdraw_network: zkSync\n\
             \x20 random_okx_withdraw_networks: [optimism, polygon, arbitrum]\n",
        );
        let output = expand_module(module, &mut ScriptedSampler::new([0.5]));
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].settings.network(), Some("polygon"));
    }

    #[test]
    fn plain_module_passes_through_with_sampled_count() {
        let module = resolved(
            "- module_name: balance-checker\n  count: [3, 3]\n  index_group: 0\n  network: bsc\n",
        );
        let output = expand_module(module, &mut RandomSampler::seeded(3));
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].count, 3);
        assert_eq!(output[0].module_name, ModuleKind::BalanceChecker);
        assert!(!output[0].is_reverse);
    }

    #[test]
    fn src_without_destinations_is_not_expanded() {
        let module = resolved(
            "- module_name: sync-swap\n  count: [2, 2]\n  index_group: 0\n  src_token: ETH\n",
        );
        let output = expand_module(module, &mut RandomSampler::seeded(3));
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].count, 2);
    }
}
