use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::plan::build_plans;
use crate::cli::args::DryRunCmd;
use crate::cli::context::RunContext;
use crate::execution::{
    DryRunHandler, ExecutionError, HandlerRegistry, RunOptions, WalletRunner, run_wallets,
};
use crate::wallet::{SavedModules, SnapshotStore};

pub async fn handle_dry_run_cmd(cmd: DryRunCmd, ctx: &RunContext) -> Result<()> {
    let route_key = ctx.route_key(&cmd.route);
    let store = ctx.snapshot_store();
    let saved = select_plans(&cmd, ctx, &store)?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(target: "cli::dry_run", "收到终止信号，停止运行");
            shutdown.cancel();
        }
    });

    let registry = Arc::new(HandlerRegistry::with_fallback(Arc::new(DryRunHandler)));
    let runner = WalletRunner::new(registry, cancel).apply_delays(!cmd.no_delay);
    let execution = &ctx.loaded.config.execution;
    let options = RunOptions {
        max_parallel_wallets: execution.max_parallel_wallets,
        apply_delays: !cmd.no_delay,
        seed: ctx.loaded.config.planner.seed,
    };

    match run_wallets(&runner, saved, Some(&store), &options).await {
        Ok(reports) => {
            for report in &reports {
                println!(
                    "{}: 成功 {} / 失败 {} / 跳过 {}{}",
                    report.wallet_id,
                    report.succeeded,
                    report.failed,
                    report.skipped,
                    if report.stopped { "（已停止）" } else { "" }
                );
            }
            Ok(())
        }
        Err(ExecutionError::Cancelled) => {
            println!(
                "已取消，进度保存在 {}，可用 --resume 继续",
                store.path(&route_key).display()
            );
            Ok(())
        }
        Err(err) => Err(err).context("路线执行失败"),
    }
}

/// `--resume` 时优先使用未完成的快照，否则重新规划。
fn select_plans(cmd: &DryRunCmd, ctx: &RunContext, store: &SnapshotStore) -> Result<SavedModules> {
    let route_key = ctx.route_key(&cmd.route);
    if cmd.resume {
        match store.load(&route_key)? {
            Some(saved) if saved.is_resumable() => {
                info!(
                    target: "cli::dry_run",
                    route = %route_key,
                    wallets = saved.wallets_with_modules.len(),
                    "继续执行未完成的快照"
                );
                return Ok(saved);
            }
            _ => warn!(
                target: "cli::dry_run",
                route = %route_key,
                "没有可继续的快照，重新规划"
            ),
        }
    }
    Ok(SavedModules::new(route_key, build_plans(ctx, &cmd.route)?))
}
