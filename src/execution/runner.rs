use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{StreamExt, stream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{ExecutionError, ExecutionResult};
use super::handler::{ExecutionContext, HandlerRegistry, ModuleOutcome, ModuleStatus};
use crate::monitoring::events;
use crate::planner::sampler::sample_number;
use crate::planner::{ModuleKind, RandomSampler, Sampler, TransformedModuleConfig};
use crate::wallet::{SavedModules, SnapshotStore, WalletData};

/// 延迟采样器的种子偏移，避免与规划使用的序列重合。
const DELAY_SEED_OFFSET: u64 = 1 << 32;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletReport {
    pub wallet_id: String,
    pub succeeded: u32,
    pub failed: u32,
    pub skipped: u32,
    /// 因 `Critical` 或 `stop_wallet_on_error` 提前结束。
    pub stopped: bool,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub max_parallel_wallets: usize,
    pub apply_delays: bool,
    pub seed: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_parallel_wallets: 1,
            apply_delays: true,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WalletRunner {
    registry: Arc<HandlerRegistry>,
    cancel: CancellationToken,
    apply_delays: bool,
}

impl WalletRunner {
    pub fn new(registry: Arc<HandlerRegistry>, cancel: CancellationToken) -> Self {
        Self {
            registry,
            cancel,
            apply_delays: true,
        }
    }

    pub fn apply_delays(mut self, enabled: bool) -> Self {
        self.apply_delays = enabled;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// 按顺序执行一个钱包的计划，每个模块执行 `count` 次。
    pub async fn run<S: Sampler + Send + ?Sized>(
        &self,
        wallet: &WalletData,
        plan: &[TransformedModuleConfig],
        sampler: &mut S,
    ) -> ExecutionResult<WalletReport> {
        let mut report = WalletReport {
            wallet_id: wallet.id.clone(),
            ..WalletReport::default()
        };
        let mut skipped_kinds: BTreeSet<ModuleKind> = BTreeSet::new();
        let wallet_name = wallet.display_name();
        let total_invocations: u32 = plan.iter().map(|module| module.count).sum();
        // 上一次实际执行的模块；下一次调用前按它的 `delay` 等待。
        let mut previous: Option<&TransformedModuleConfig> = None;

        info!(
            target: "execution::wallet",
            wallet = wallet_name,
            modules = plan.len(),
            invocations = total_invocations,
            "开始执行钱包计划"
        );

        'plan: for module in plan {
            if skipped_kinds.contains(&module.module_name) {
                report.skipped += 1;
                events::module_skipped(
                    wallet_name,
                    module.module_name.as_str(),
                    "stop_modules_on_error",
                );
                continue;
            }
            let handler = self.registry.resolve(&module.module_name)?;

            for repetition in 1..=module.count {
                if self.cancel.is_cancelled() {
                    return Err(ExecutionError::Cancelled);
                }
                if let Some(previous) = previous {
                    self.pause(previous, sampler).await?;
                }

                let ctx = ExecutionContext {
                    wallet,
                    repetition,
                    total: module.count,
                };
                let started = Instant::now();
                let outcome = match handler.execute(&ctx, module).await {
                    Ok(outcome) => outcome,
                    Err(ExecutionError::Cancelled) => return Err(ExecutionError::Cancelled),
                    Err(err) => ModuleOutcome::error(err.to_string()),
                };
                events::module_finished(
                    wallet_name,
                    module.module_name.as_str(),
                    outcome.status,
                    started.elapsed(),
                    outcome.message.as_deref(),
                );
                previous = Some(module);

                match outcome.status {
                    ModuleStatus::Success | ModuleStatus::Passed | ModuleStatus::Warning => {
                        report.succeeded += 1;
                    }
                    ModuleStatus::Error => {
                        report.failed += 1;
                        skipped_kinds.extend(module.base.stop_modules_on_error.iter().cloned());
                        if module.base.stop_wallet_on_error {
                            report.stopped = true;
                            break 'plan;
                        }
                        // 出错后不再重复当前模块
                        break;
                    }
                    ModuleStatus::Critical => {
                        report.failed += 1;
                        report.stopped = true;
                        break 'plan;
                    }
                }
            }
        }

        Ok(report)
    }

    async fn pause<S: Sampler + Send + ?Sized>(
        &self,
        module: &TransformedModuleConfig,
        sampler: &mut S,
    ) -> ExecutionResult<()> {
        if !self.apply_delays || module.base.delay.is_zero() {
            return Ok(());
        }
        let seconds = sample_number(sampler, module.base.delay);
        if seconds <= 0.0 {
            return Ok(());
        }
        debug!(
            target: "execution::wallet",
            module = %module.module_name,
            delay_secs = format_args!("{seconds:.1}"),
            "等待下一次调用"
        );
        tokio::select! {
            _ = self.cancel.cancelled() => Err(ExecutionError::Cancelled),
            _ = tokio::time::sleep(Duration::from_secs_f64(seconds)) => Ok(()),
        }
    }
}

/// 以最多 `max_parallel_wallets` 个并发执行快照中的所有钱包；每个钱包结束后从快照中移除，
/// 全部结束后标记完成。快照写入失败只记录日志。
pub async fn run_wallets(
    runner: &WalletRunner,
    saved: SavedModules,
    store: Option<&SnapshotStore>,
    options: &RunOptions,
) -> ExecutionResult<Vec<WalletReport>> {
    runner.registry().ensure_covers(
        saved
            .wallets_with_modules
            .iter()
            .flat_map(|entry| entry.modules.iter().map(|module| &module.module_name)),
    )?;

    let route = saved.route.clone();
    let entries = saved.wallets_with_modules.clone();
    let snapshot = Arc::new(Mutex::new(saved));
    if let Some(store) = store {
        store.save(&*snapshot.lock().await)?;
    }

    let parallel = options.max_parallel_wallets.max(1);
    let seed = options.seed;
    let mut results = stream::iter(entries.into_iter().enumerate())
        .map(|(index, entry)| {
            let runner = runner.clone().apply_delays(runner.apply_delays && options.apply_delays);
            async move {
                let mut sampler = RandomSampler::derive(
                    seed.map(|seed| seed.wrapping_add(DELAY_SEED_OFFSET)),
                    index as u64,
                );
                let result = runner.run(&entry.wallet, &entry.modules, &mut sampler).await;
                (entry.wallet.id, result)
            }
        })
        .buffer_unordered(parallel);

    let mut reports = Vec::new();
    while let Some((wallet_id, result)) = results.next().await {
        let report = result?;
        events::wallet_finished(&report);
        reports.push(report);

        let mut guard = snapshot.lock().await;
        guard.remove_wallet(&wallet_id);
        if let Some(store) = store {
            if let Err(err) = store.save(&guard) {
                events::snapshot_write_failed(&route, &err);
            }
        }
    }

    let mut guard = snapshot.lock().await;
    guard.is_finished = true;
    if let Some(store) = store {
        store.save(&guard)?;
    }
    if reports.iter().any(|report| report.stopped) {
        warn!(target: "execution::wallet", route = %route, "部分钱包提前停止");
    }
    info!(
        target: "execution::wallet",
        route = %route,
        wallets = reports.len(),
        "路线执行完成"
    );
    Ok(reports)
}
