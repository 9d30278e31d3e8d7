//! 钱包列表与每个钱包的执行计划。

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::planner::{
    PlanBuilder, PlanResult, PlanSummary, RandomSampler, RouteSettings, Sampler,
    TransformedModuleConfig, sampler,
};

pub mod snapshot;

pub use snapshot::{SavedModules, SnapshotError, SnapshotStore};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("failed to read wallets at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse wallets at {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("钱包 id 重复: {0}")]
    DuplicateId(String),
    #[error("钱包列表为空: {0}")]
    Empty(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletData {
    pub id: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// 交易所充值地址，归集模块使用。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub okx_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

impl WalletData {
    /// 日志里使用的名称：优先 label。
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

pub fn load_wallets(path: &Path) -> Result<Vec<WalletData>, WalletError> {
    let contents = fs::read_to_string(path).map_err(|source| WalletError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let wallets: Vec<WalletData> =
        serde_yaml::from_str(&contents).map_err(|err| WalletError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

    if wallets.is_empty() {
        return Err(WalletError::Empty(path.to_path_buf()));
    }

    let mut seen = HashSet::with_capacity(wallets.len());
    for wallet in &wallets {
        if !seen.insert(wallet.id.as_str()) {
            return Err(WalletError::DuplicateId(wallet.id.clone()));
        }
    }

    debug!(
        target: "wallet",
        path = %path.display(),
        count = wallets.len(),
        "钱包列表已加载"
    );
    Ok(wallets)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletWithModules {
    pub wallet: WalletData,
    pub modules: Vec<TransformedModuleConfig>,
}

/// 为每个钱包独立生成计划。给定 `seed` 时，第 `i` 个钱包使用 `seed + i` 派生的采样器，
/// 结果可复现；`shuffle_wallets` 打乱钱包顺序，使用单独的采样器。
pub fn plan_wallets(
    wallets: &[WalletData],
    route: &RouteSettings,
    builder: &PlanBuilder<'_>,
    seed: Option<u64>,
    shuffle_wallets: bool,
) -> PlanResult<Vec<WalletWithModules>> {
    let mut planned = Vec::with_capacity(wallets.len());
    for (index, wallet) in wallets.iter().enumerate() {
        let mut wallet_sampler = RandomSampler::derive(seed, index as u64);
        let modules = builder.build(route, &mut wallet_sampler)?;
        let summary = PlanSummary::from_plan(&modules);
        info!(
            target: "wallet::plan",
            wallet = wallet.display_name(),
            invocations = summary.invocations,
            transactions = summary.transactions,
            reverse_legs = summary.reverse_legs,
            "钱包计划已生成"
        );
        planned.push(WalletWithModules {
            wallet: wallet.clone(),
            modules,
        });
    }

    if shuffle_wallets {
        let mut order_sampler = RandomSampler::derive(seed, wallets.len() as u64);
        shuffle_wallet_order(&mut planned, &mut order_sampler);
    }

    Ok(planned)
}

fn shuffle_wallet_order<S: Sampler + ?Sized>(planned: &mut [WalletWithModules], sampler: &mut S) {
    sampler::shuffle(sampler, planned);
}
