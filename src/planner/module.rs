use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::{PlanError, PlanResult};
use super::kind::{Exchange, ModuleFamily, ModuleKind};
use super::overrides::{AccountSelector, MaxGas, ModuleOverrides, TokenPair};
use super::range::{CountRange, NumberRange};

/// 反向交易缺省使用的百分比区间：卖出正向交易换得的几乎全部代币。
pub const DEFAULT_REVERSE_PERCENT: NumberRange = NumberRange::fixed(99.99);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GasSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gas: Option<MaxGas>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gwei_range: Option<NumberRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit_range: Option<NumberRange>,
}

/// 所有模块共享的基础字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleBase {
    pub index_group: u32,
    /// 同一模块内相邻交易之间的等待秒数区间。
    pub delay: NumberRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_native_balance: Option<f64>,
    #[serde(default)]
    pub stop_wallet_on_error: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_modules_on_error: Vec<ModuleKind>,
    #[serde(default)]
    pub gas: GasSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmountSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<NumberRange>,
    #[serde(default)]
    pub use_percent_balance: bool,
}

/// 兑换类字段：代币对、合约对、源/目标代币以及正反向金额。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairs: Option<TokenPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_pairs: Option<TokenPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_token: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dest_tokens: Vec<String>,
    #[serde(default)]
    pub amount: AmountSettings,
    #[serde(default)]
    pub reverse: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_amount: Option<NumberRange>,
}

impl TradeSettings {
    fn from_overrides(o: &mut ModuleOverrides) -> Self {
        Self {
            pairs: o.pairs.take(),
            contract_pairs: o.contract_pairs.take(),
            src_token: o.src_token.take(),
            dest_tokens: o.dest_tokens.take().unwrap_or_default(),
            amount: AmountSettings {
                range: o.min_and_max_amount.take(),
                use_percent_balance: o.use_percent_balance.take().unwrap_or(false),
            },
            reverse: o.reverse.take().unwrap_or(false),
            reverse_amount: o.reverse_min_and_max_amount.take(),
        }
    }

    pub fn has_src_and_dest(&self) -> bool {
        self.src_token.is_some() && !self.dest_tokens.is_empty()
    }

    /// 需要展开为正向/反向调用的模块。
    pub fn is_pair_bearing(&self) -> bool {
        self.contract_pairs.is_some() || self.pairs.is_some() || self.has_src_and_dest()
    }

    pub fn reverse_amount_or_default(&self) -> NumberRange {
        self.reverse_amount.unwrap_or(DEFAULT_REVERSE_PERCENT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceCheckSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub amount: AmountSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_token_balance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectSettings {
    #[serde(default)]
    pub accounts: AccountSelector,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collect_tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawSettings {
    pub exchange: Exchange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub random_networks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub amount: AmountSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_token_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_balance: Option<NumberRange>,
    #[serde(default)]
    pub use_usd: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_network: Option<String>,
    /// 执行层从中挑选余额满足 `min_token_balance` 的网络。
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub random_networks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub trade: TradeSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_token_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_dest_token_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_balance: Option<NumberRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slippage: Option<f64>,
    #[serde(default)]
    pub use_usd: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwapSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slippage: Option<f64>,
    #[serde(default)]
    pub trade: TradeSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default)]
    pub trade: TradeSettings,
}

/// 未归类模块（含未知名称）：保留通用字段，其余字段走 `extra`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub trade: TradeSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_token_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModuleSettings {
    BalanceCheck(BalanceCheckSettings),
    Transfer(TransferSettings),
    Collect(CollectSettings),
    Withdraw(WithdrawSettings),
    Bridge(BridgeSettings),
    Swap(SwapSettings),
    Claim(ClaimSettings),
    Custom(CustomSettings),
}

impl ModuleSettings {
    pub fn trade(&self) -> Option<&TradeSettings> {
        match self {
            ModuleSettings::Bridge(settings) => Some(&settings.trade),
            ModuleSettings::Swap(settings) => Some(&settings.trade),
            ModuleSettings::Claim(settings) => Some(&settings.trade),
            ModuleSettings::Custom(settings) => Some(&settings.trade),
            _ => None,
        }
    }

    pub fn trade_mut(&mut self) -> Option<&mut TradeSettings> {
        match self {
            ModuleSettings::Bridge(settings) => Some(&mut settings.trade),
            ModuleSettings::Swap(settings) => Some(&mut settings.trade),
            ModuleSettings::Claim(settings) => Some(&mut settings.trade),
            ModuleSettings::Custom(settings) => Some(&mut settings.trade),
            _ => None,
        }
    }

    pub fn network(&self) -> Option<&str> {
        match self {
            ModuleSettings::BalanceCheck(settings) => settings.network.as_deref(),
            ModuleSettings::Transfer(settings) => settings.network.as_deref(),
            ModuleSettings::Collect(_) => None,
            ModuleSettings::Withdraw(settings) => settings.network.as_deref(),
            ModuleSettings::Bridge(settings) => settings.network.as_deref(),
            ModuleSettings::Swap(settings) => settings.network.as_deref(),
            ModuleSettings::Claim(settings) => settings.network.as_deref(),
            ModuleSettings::Custom(settings) => settings.network.as_deref(),
        }
    }

    fn from_overrides(family: ModuleFamily, o: &mut ModuleOverrides) -> Self {
        match family {
            ModuleFamily::BalanceCheck => ModuleSettings::BalanceCheck(BalanceCheckSettings {
                network: o.network.take(),
                contract_address: o.contract_address.take(),
            }),
            ModuleFamily::Transfer => ModuleSettings::Transfer(TransferSettings {
                network: o.network.take(),
                contract_address: o.contract_address.take(),
                amount: AmountSettings {
                    range: o.min_and_max_amount.take(),
                    use_percent_balance: o.use_percent_balance.take().unwrap_or(false),
                },
                min_token_balance: o.min_token_balance.take(),
            }),
            ModuleFamily::Collect => ModuleSettings::Collect(CollectSettings {
                accounts: o.accounts.take().unwrap_or_default(),
                collect_tokens: o.collect_tokens.take().unwrap_or_default(),
            }),
            ModuleFamily::Withdraw(exchange) => ModuleSettings::Withdraw(WithdrawSettings {
                exchange,
                network: o.withdraw_network.take().or_else(|| o.network.take()),
                random_networks: o.random_withdraw_networks.take().unwrap_or_default(),
                token: o.token_to_withdraw.take(),
                amount: AmountSettings {
                    range: o.min_and_max_amount.take(),
                    use_percent_balance: o.use_percent_balance.take().unwrap_or(false),
                },
                min_token_balance: o.min_token_balance.take(),
                min_amount: o.min_amount.take(),
                expected_balance: o.expected_balance.take(),
                use_usd: o.use_usd.take().unwrap_or(false),
            }),
            ModuleFamily::Bridge => ModuleSettings::Bridge(BridgeSettings {
                network: o.network.take(),
                destination_network: o.destination_network.take(),
                random_networks: o.random_networks.take().unwrap_or_default(),
                contract_address: o.contract_address.take(),
                trade: TradeSettings::from_overrides(o),
                min_token_balance: o.min_token_balance.take(),
                min_dest_token_balance: o.min_dest_token_balance.take(),
                min_amount: o.min_amount.take(),
                max_fee: o.max_fee.take(),
                expected_balance: o.expected_balance.take(),
                slippage: o.slippage.take(),
                use_usd: o.use_usd.take().unwrap_or(false),
            }),
            ModuleFamily::Swap => ModuleSettings::Swap(SwapSettings {
                network: o.network.take(),
                slippage: o.slippage.take(),
                trade: TradeSettings::from_overrides(o),
            }),
            ModuleFamily::Claim => ModuleSettings::Claim(ClaimSettings {
                network: o.network.take(),
                trade: TradeSettings::from_overrides(o),
            }),
            ModuleFamily::Custom => ModuleSettings::Custom(CustomSettings {
                network: o.network.take(),
                destination_network: o.destination_network.take(),
                contract_address: o.contract_address.take(),
                trade: TradeSettings::from_overrides(o),
                min_token_balance: o.min_token_balance.take(),
                min_amount: o.min_amount.take(),
            }),
        }
    }
}

/// 合并默认配置与路线覆盖项后的模块配置，`count` 仍为区间。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub module_name: ModuleKind,
    pub count: CountRange,
    /// 拆分重复次数后保留的原始区间。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_count: Option<CountRange>,
    pub base: ModuleBase,
    pub settings: ModuleSettings,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ModuleConfig {
    /// 将合并后的部分配置解析为强类型配置；`count` 与 `index_group` 必须存在。
    pub fn resolve(module_name: ModuleKind, merged: ModuleOverrides) -> PlanResult<Self> {
        let mut o = merged;

        let count = o.count.take().ok_or_else(|| PlanError::MissingField {
            module: module_name.to_string(),
            field: "count",
        })?;
        let index_group = o.index_group.take().ok_or_else(|| PlanError::MissingField {
            module: module_name.to_string(),
            field: "index_group",
        })?;

        let base = ModuleBase {
            index_group,
            delay: o.delay.take().unwrap_or_default(),
            min_native_balance: o.min_native_balance.take(),
            stop_wallet_on_error: o.stop_wallet_on_error.take().unwrap_or(false),
            stop_modules_on_error: o.stop_modules_on_error.take().unwrap_or_default(),
            gas: GasSettings {
                max_gas: o.max_gas.take(),
                gwei_range: o.gwei_range.take(),
                gas_limit_range: o.gas_limit_range.take(),
            },
        };
        let settings = ModuleSettings::from_overrides(module_name.family(), &mut o);

        // 该模块族没有位置的已知字段并入 `extra`，执行层仍能读到。
        let mut extra = std::mem::take(&mut o.extra);
        if let Ok(serde_json::Value::Object(leftover)) = serde_json::to_value(&o) {
            for (key, value) in leftover {
                extra.entry(key).or_insert(value);
            }
        }

        Ok(Self {
            module_name,
            count,
            original_count: None,
            base,
            settings,
            extra,
        })
    }
}

/// 最终抽取的金额：`percent` 为 true 时表示余额百分比。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAmount {
    pub value: f64,
    pub percent: bool,
}

/// 完成次数解析与代币对展开后的单次调用，交给执行层。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedModuleConfig {
    pub module_name: ModuleKind,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_count: Option<CountRange>,
    pub base: ModuleBase,
    pub settings: ModuleSettings,
    #[serde(default)]
    pub is_reverse: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<ResolvedAmount>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TransformedModuleConfig {
    pub fn from_config(module: ModuleConfig, count: u32) -> Self {
        Self {
            module_name: module.module_name,
            count,
            original_count: module.original_count,
            base: module.base,
            settings: module.settings,
            is_reverse: false,
            amount: None,
            extra: module.extra,
        }
    }

    pub fn pairs(&self) -> Option<&TokenPair> {
        self.settings.trade().and_then(|trade| trade.pairs.as_ref())
    }

    pub fn contract_pairs(&self) -> Option<&TokenPair> {
        self.settings
            .trade()
            .and_then(|trade| trade.contract_pairs.as_ref())
    }

    /// 日志中使用的简短描述，例如 `sync-swap ETH->USDC (reverse)`。
    pub fn describe(&self) -> String {
        let mut label = self.module_name.to_string();
        if let Some(pair) = self.pairs().or_else(|| self.contract_pairs()) {
            label.push_str(&format!(" {}->{}", pair.source, pair.destination));
        } else if let Some(network) = self.settings.network() {
            label.push_str(&format!(" @{network}"));
        }
        if self.is_reverse {
            label.push_str(" (reverse)");
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(yaml: &str) -> ModuleOverrides {
        serde_yaml::from_str(yaml).expect("parse overrides")
    }

    #[test]
    fn resolve_requires_count_and_index_group() {
        let err = ModuleConfig::resolve(ModuleKind::SyncSwap, overrides("index_group: 1"))
            .unwrap_err();
        assert!(matches!(err, PlanError::MissingField { field: "count", .. }));

        let err = ModuleConfig::resolve(ModuleKind::SyncSwap, overrides("count: [1, 1]"))
            .unwrap_err();
        assert!(matches!(
            err,
            PlanError::MissingField {
                field: "index_group",
                ..
            }
        ));
    }

    #[test]
    fn swap_family_collects_trade_fields() {
        let config = ModuleConfig::resolve(
            ModuleKind::IzumiSwap,
            overrides(
                "count: [1, 2]\nindex_group: 0\nsrc_token: ETH\ndest_tokens: [USDC, USDT]\n\
                 min_and_max_amount: [70, 80]\nuse_percent_balance: true\nslippage: 1\n",
            ),
        )
        .unwrap();

        let ModuleSettings::Swap(swap) = &config.settings else {
            panic!("expected swap settings");
        };
        assert_eq!(swap.slippage, Some(1.0));
        assert!(swap.trade.is_pair_bearing());
        assert!(swap.trade.amount.use_percent_balance);
        assert_eq!(swap.trade.reverse_amount_or_default(), DEFAULT_REVERSE_PERCENT);
        assert_eq!(config.base.delay, NumberRange::zero());
    }

    #[test]
    fn withdraw_family_prefers_exchange_network() {
        let config = ModuleConfig::resolve(
            ModuleKind::OkxWithdraw,
            overrides(
                "count: [1, 1]\nindex_group: 0\nokx_withdraw_network: zkSync\nnetwork: eth\n\
                 token_to_withdraw: ETH\n",
            ),
        )
        .unwrap();
        let ModuleSettings::Withdraw(withdraw) = &config.settings else {
            panic!("expected withdraw settings");
        };
        assert_eq!(withdraw.exchange, Exchange::Okx);
        assert_eq!(withdraw.network.as_deref(), Some("zkSync"));
        assert_eq!(withdraw.token.as_deref(), Some("ETH"));
    }

    #[test]
    fn fields_without_a_family_slot_move_to_extra() {
        let config = ModuleConfig::resolve(
            ModuleKind::SyncSwap,
            overrides(
                "count: [1, 1]\nindex_group: 0\npairs: [ETH, USDC]\nmin_token_balance: 5\n\
                 contract_address: '0xabc'\ndestination_network: zkSync\n",
            ),
        )
        .unwrap();

        assert_eq!(config.extra.get("min_token_balance"), Some(&serde_json::json!(5.0)));
        assert_eq!(config.extra.get("contract_address"), Some(&serde_json::json!("0xabc")));
        assert_eq!(
            config.extra.get("destination_network"),
            Some(&serde_json::json!("zkSync"))
        );
        assert!(!config.extra.contains_key("pairs"));
        assert!(!config.extra.contains_key("count"));
        assert!(!config.extra.contains_key("index_group"));
    }

    #[test]
    fn collect_keeps_network_in_extra() {
        let config = ModuleConfig::resolve(
            ModuleKind::OkxCollect,
            overrides("count: [1, 1]\nindex_group: 0\nnetwork: eth\n"),
        )
        .unwrap();
        assert_eq!(config.extra.get("network"), Some(&serde_json::json!("eth")));
    }

    #[test]
    fn settings_survive_json_round_trip() {
        let config = ModuleConfig::resolve(
            ModuleKind::OkxCollect,
            overrides("count: [1, 1]\nindex_group: 0\nokx_accounts: all\ncustom_flag: 3\n"),
        )
        .unwrap();
        let transformed = TransformedModuleConfig::from_config(config, 1);
        let json = serde_json::to_string(&transformed).unwrap();
        let back: TransformedModuleConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, transformed);
        assert_eq!(back.extra.get("custom_flag"), Some(&serde_json::json!(3)));
    }
}
