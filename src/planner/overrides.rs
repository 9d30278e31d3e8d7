use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize, Serializer};

use super::kind::ModuleKind;
use super::range::{CountRange, NumberRange};

/// 有序的二元组（源，目标），用于代币对或合约对。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[String; 2]", into = "[String; 2]")]
pub struct TokenPair {
    pub source: String,
    pub destination: String,
}

impl TokenPair {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            source: self.destination.clone(),
            destination: self.source.clone(),
        }
    }
}

impl From<[String; 2]> for TokenPair {
    fn from([source, destination]: [String; 2]) -> Self {
        Self {
            source,
            destination,
        }
    }
}

impl From<TokenPair> for [String; 2] {
    fn from(pair: TokenPair) -> Self {
        [pair.source, pair.destination]
    }
}

/// `max_gas: [network, gwei]`：超过该 gwei 时执行层等待。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, f64)", into = "(String, f64)")]
pub struct MaxGas {
    pub network: String,
    pub gwei: f64,
}

impl From<(String, f64)> for MaxGas {
    fn from((network, gwei): (String, f64)) -> Self {
        Self { network, gwei }
    }
}

impl From<MaxGas> for (String, f64) {
    fn from(value: MaxGas) -> Self {
        (value.network, value.gwei)
    }
}

/// 归集模块的账户选择：`all` 或账户名列表。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AccountSelector {
    #[default]
    All,
    Accounts(Vec<String>),
}

impl Serialize for AccountSelector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            AccountSelector::All => serializer.serialize_str("all"),
            AccountSelector::Accounts(list) => list.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AccountSelectorField {
    Single(String),
    Multiple(Vec<String>),
}

impl<'de> Deserialize<'de> for AccountSelector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = match AccountSelectorField::deserialize(deserializer)? {
            AccountSelectorField::Single(value) if value.trim().eq_ignore_ascii_case("all") => {
                return Ok(AccountSelector::All);
            }
            AccountSelectorField::Single(value) => vec![value],
            AccountSelectorField::Multiple(list) => list,
        };

        let mut accounts = Vec::new();
        for value in values {
            let trimmed = value.trim();
            if trimmed.is_empty() || accounts.iter().any(|seen: &String| seen == trimmed) {
                continue;
            }
            accounts.push(trimmed.to_string());
        }
        Ok(AccountSelector::Accounts(accounts))
    }
}

/// 模块的部分配置：默认配置与路线覆盖项共用同一结构，所有字段均可缺省。
/// 字段同时接受 camelCase 写法。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<CountRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<NumberRange>,
    #[serde(alias = "indexGroup", skip_serializing_if = "Option::is_none")]
    pub index_group: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(alias = "destinationNetwork", skip_serializing_if = "Option::is_none")]
    pub destination_network: Option<String>,
    #[serde(alias = "randomNetworks", skip_serializing_if = "Option::is_none")]
    pub random_networks: Option<Vec<String>>,
    #[serde(alias = "contractAddress", skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,

    #[serde(alias = "minAndMaxAmount", skip_serializing_if = "Option::is_none")]
    pub min_and_max_amount: Option<NumberRange>,
    #[serde(alias = "usePercentBalance", skip_serializing_if = "Option::is_none")]
    pub use_percent_balance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<bool>,
    #[serde(alias = "reverseMinAndMaxAmount", skip_serializing_if = "Option::is_none")]
    pub reverse_min_and_max_amount: Option<NumberRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairs: Option<TokenPair>,
    #[serde(alias = "contractPairs", skip_serializing_if = "Option::is_none")]
    pub contract_pairs: Option<TokenPair>,
    #[serde(alias = "srcToken", skip_serializing_if = "Option::is_none")]
    pub src_token: Option<String>,
    #[serde(alias = "destTokens", skip_serializing_if = "Option::is_none")]
    pub dest_tokens: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slippage: Option<f64>,

    #[serde(alias = "minNativeBalance", skip_serializing_if = "Option::is_none")]
    pub min_native_balance: Option<f64>,
    #[serde(alias = "minTokenBalance", skip_serializing_if = "Option::is_none")]
    pub min_token_balance: Option<f64>,
    #[serde(alias = "minDestTokenBalance", skip_serializing_if = "Option::is_none")]
    pub min_dest_token_balance: Option<f64>,
    #[serde(alias = "minAmount", skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(alias = "maxFee", skip_serializing_if = "Option::is_none")]
    pub max_fee: Option<f64>,
    #[serde(alias = "expectedBalance", skip_serializing_if = "Option::is_none")]
    pub expected_balance: Option<NumberRange>,
    #[serde(alias = "useUsd", skip_serializing_if = "Option::is_none")]
    pub use_usd: Option<bool>,

    #[serde(alias = "tokenToWithdraw", skip_serializing_if = "Option::is_none")]
    pub token_to_withdraw: Option<String>,
    #[serde(
        alias = "withdrawNetwork",
        alias = "okx_withdraw_network",
        alias = "okxWithdrawNetwork",
        alias = "binance_withdraw_network",
        alias = "binanceWithdrawNetwork",
        skip_serializing_if = "Option::is_none"
    )]
    pub withdraw_network: Option<String>,
    #[serde(
        alias = "randomWithdrawNetworks",
        alias = "random_okx_withdraw_networks",
        alias = "randomOkxWithdrawNetworks",
        alias = "random_binance_withdraw_networks",
        alias = "randomBinanceWithdrawNetworks",
        skip_serializing_if = "Option::is_none"
    )]
    pub random_withdraw_networks: Option<Vec<String>>,

    #[serde(alias = "okx_accounts", alias = "okxAccounts", skip_serializing_if = "Option::is_none")]
    pub accounts: Option<AccountSelector>,
    #[serde(alias = "collectTokens", skip_serializing_if = "Option::is_none")]
    pub collect_tokens: Option<Vec<String>>,

    #[serde(alias = "stopWalletOnError", skip_serializing_if = "Option::is_none")]
    pub stop_wallet_on_error: Option<bool>,
    #[serde(alias = "stopModulesOnError", skip_serializing_if = "Option::is_none")]
    pub stop_modules_on_error: Option<Vec<ModuleKind>>,
    #[serde(alias = "maxGas", skip_serializing_if = "Option::is_none")]
    pub max_gas: Option<MaxGas>,
    #[serde(alias = "gweiRange", skip_serializing_if = "Option::is_none")]
    pub gwei_range: Option<NumberRange>,
    #[serde(alias = "gasLimitRange", skip_serializing_if = "Option::is_none")]
    pub gas_limit_range: Option<NumberRange>,

    /// 未识别的字段原样透传给执行层。
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

macro_rules! overlay_fields {
    ($base:ident, $top:ident, $($field:ident),+ $(,)?) => {
        $(
            if $top.$field.is_some() {
                $base.$field = $top.$field;
            }
        )+
    };
}

impl ModuleOverrides {
    /// 以 `top` 覆盖 `self`：`top` 中存在的字段优先。
    pub fn overlay(self, top: ModuleOverrides) -> ModuleOverrides {
        let mut base = self;
        overlay_fields!(
            base,
            top,
            count,
            delay,
            index_group,
            network,
            destination_network,
            random_networks,
            contract_address,
            min_and_max_amount,
            use_percent_balance,
            reverse,
            reverse_min_and_max_amount,
            pairs,
            contract_pairs,
            src_token,
            dest_tokens,
            slippage,
            min_native_balance,
            min_token_balance,
            min_dest_token_balance,
            min_amount,
            max_fee,
            expected_balance,
            use_usd,
            token_to_withdraw,
            withdraw_network,
            random_withdraw_networks,
            accounts,
            collect_tokens,
            stop_wallet_on_error,
            stop_modules_on_error,
            max_gas,
            gwei_range,
            gas_limit_range,
        );
        base.extra.extend(top.extra);
        base
    }

    pub fn is_empty(&self) -> bool {
        *self == ModuleOverrides::default()
    }
}
