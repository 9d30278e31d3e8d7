use std::fmt;
use std::str::FromStr;

use serde::de::{Error as DeError, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 已知模块类型的封闭集合；路线中出现的未知名称保留为 `Other`，不会报错。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleKind {
    BalanceChecker,
    CheckNativeBalance,
    TransferToken,
    TopUpEthMainnet,
    OkxCollect,
    BitgetCollect,
    BinanceWithdraw,
    OkxWithdraw,
    RouternitroBridge,
    OrbiterBridge,
    IzumiSwap,
    SyncSwap,
    OneInchSwap,
    PolyhedraCheckClaim,
    PolyhedraClaim,
    PolyhedraTransferClaim,
    LayerZeroClaim,
    ScrollClaim,
    Other(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exchange {
    Okx,
    Binance,
}

impl Exchange {
    pub fn as_str(self) -> &'static str {
        match self {
            Exchange::Okx => "okx",
            Exchange::Binance => "binance",
        }
    }
}

/// 模块族决定解析后的强类型配置形态。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleFamily {
    BalanceCheck,
    Transfer,
    Collect,
    Withdraw(Exchange),
    Bridge,
    Swap,
    Claim,
    Custom,
}

impl ModuleKind {
    pub const KNOWN: &'static [ModuleKind] = &[
        ModuleKind::BalanceChecker,
        ModuleKind::CheckNativeBalance,
        ModuleKind::TransferToken,
        ModuleKind::TopUpEthMainnet,
        ModuleKind::OkxCollect,
        ModuleKind::BitgetCollect,
        ModuleKind::BinanceWithdraw,
        ModuleKind::OkxWithdraw,
        ModuleKind::RouternitroBridge,
        ModuleKind::OrbiterBridge,
        ModuleKind::IzumiSwap,
        ModuleKind::SyncSwap,
        ModuleKind::OneInchSwap,
        ModuleKind::PolyhedraCheckClaim,
        ModuleKind::PolyhedraClaim,
        ModuleKind::PolyhedraTransferClaim,
        ModuleKind::LayerZeroClaim,
        ModuleKind::ScrollClaim,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ModuleKind::BalanceChecker => "balance-checker",
            ModuleKind::CheckNativeBalance => "check-native-balance",
            ModuleKind::TransferToken => "transfer-token",
            ModuleKind::TopUpEthMainnet => "top-up-eth-mainnet",
            ModuleKind::OkxCollect => "okx-collect",
            ModuleKind::BitgetCollect => "bitget-collect",
            ModuleKind::BinanceWithdraw => "binance-withdraw",
            ModuleKind::OkxWithdraw => "okx-withdraw",
            ModuleKind::RouternitroBridge => "routernitro-bridge",
            ModuleKind::OrbiterBridge => "orbiter-bridge",
            ModuleKind::IzumiSwap => "izumi-swap",
            ModuleKind::SyncSwap => "sync-swap",
            ModuleKind::OneInchSwap => "1inch-swap",
            ModuleKind::PolyhedraCheckClaim => "polyhedra-check-claim",
            ModuleKind::PolyhedraClaim => "polyhedra-claim",
            ModuleKind::PolyhedraTransferClaim => "polyhedra-transfer-claim",
            ModuleKind::LayerZeroClaim => "layer-zero-claim",
            ModuleKind::ScrollClaim => "scroll-claim",
            ModuleKind::Other(name) => name.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ModuleKind::Other(_))
    }

    pub fn family(&self) -> ModuleFamily {
        match self {
            ModuleKind::BalanceChecker | ModuleKind::CheckNativeBalance => {
                ModuleFamily::BalanceCheck
            }
            ModuleKind::TransferToken => ModuleFamily::Transfer,
            ModuleKind::OkxCollect | ModuleKind::BitgetCollect => ModuleFamily::Collect,
            ModuleKind::BinanceWithdraw => ModuleFamily::Withdraw(Exchange::Binance),
            ModuleKind::OkxWithdraw => ModuleFamily::Withdraw(Exchange::Okx),
            ModuleKind::RouternitroBridge | ModuleKind::OrbiterBridge => ModuleFamily::Bridge,
            ModuleKind::IzumiSwap | ModuleKind::SyncSwap | ModuleKind::OneInchSwap => {
                ModuleFamily::Swap
            }
            ModuleKind::PolyhedraCheckClaim
            | ModuleKind::PolyhedraClaim
            | ModuleKind::PolyhedraTransferClaim
            | ModuleKind::LayerZeroClaim
            | ModuleKind::ScrollClaim => ModuleFamily::Claim,
            ModuleKind::TopUpEthMainnet | ModuleKind::Other(_) => ModuleFamily::Custom,
        }
    }
}

impl FromStr for ModuleKind {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let known = ModuleKind::KNOWN
            .iter()
            .find(|kind| kind.as_str() == trimmed)
            .cloned();
        Ok(known.unwrap_or_else(|| ModuleKind::Other(trimmed.to_string())))
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ModuleKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModuleKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KindVisitor;

        impl<'de> Visitor<'de> for KindVisitor {
            type Value = ModuleKind;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a module name such as `sync-swap` or `okx-withdraw`")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                if value.trim().is_empty() {
                    return Err(DeError::invalid_length(0, &self));
                }
                Ok(value.parse().unwrap_or_else(|never| match never {}))
            }
        }

        deserializer.deserialize_str(KindVisitor)
    }
}
