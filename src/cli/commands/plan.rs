use anyhow::{Context, Result};
use tracing::info;

use crate::cli::args::PlanCmd;
use crate::cli::context::RunContext;
use crate::monitoring::events;
use crate::planner::{PlanSummary, TransformedModuleConfig};
use crate::wallet::{SavedModules, WalletWithModules, plan_wallets};

pub fn handle_plan_cmd(cmd: PlanCmd, ctx: &RunContext) -> Result<()> {
    let planned = build_plans(ctx, &cmd.route)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
    } else {
        print!("{}", render_plans(&planned));
    }

    if cmd.save {
        let route_key = ctx.route_key(&cmd.route);
        let store = ctx.snapshot_store();
        store
            .save(&SavedModules::new(route_key.clone(), planned))
            .context("保存快照失败")?;
        println!("已保存快照 {}", store.path(&route_key).display());
    }
    Ok(())
}

/// 加载路线与钱包，并为每个钱包生成计划。
pub fn build_plans(ctx: &RunContext, route: &str) -> Result<Vec<WalletWithModules>> {
    let settings = ctx.route(route)?;
    let wallets = ctx.wallets()?;
    let config = &ctx.loaded.config;
    let route_key = ctx.route_key(route);

    let planned = plan_wallets(
        &wallets,
        &settings,
        &ctx.builder(),
        config.planner.seed,
        config.execution.shuffle_wallets,
    )
    .with_context(|| format!("路线 {route} 规划失败"))?;

    for entry in &planned {
        events::plan_built(
            &route_key,
            entry.wallet.display_name(),
            &PlanSummary::from_plan(&entry.modules),
        );
    }
    info!(
        target: "cli::plan",
        route = %route_key,
        wallets = planned.len(),
        "路线规划完成"
    );
    Ok(planned)
}

fn render_plans(planned: &[WalletWithModules]) -> String {
    let mut out = String::new();
    for entry in planned {
        let summary = PlanSummary::from_plan(&entry.modules);
        out.push_str(&format!(
            "钱包 {} ({}): {} 个调用, {} 笔交易\n",
            entry.wallet.display_name(),
            entry.wallet.address,
            summary.invocations,
            summary.transactions
        ));
        for (index, module) in entry.modules.iter().enumerate() {
            out.push_str(&format!("  {:>2}. {}\n", index + 1, render_invocation(module)));
        }
    }
    out
}

fn render_invocation(module: &TransformedModuleConfig) -> String {
    let mut line = module.describe();
    if module.count != 1 {
        line.push_str(&format!(" x{}", module.count));
    }
    if let Some(amount) = module.amount {
        if amount.percent {
            line.push_str(&format!(" [{:.2}%]", amount.value));
        } else {
            line.push_str(&format!(" [{}]", amount.value));
        }
    }
    line.push_str(&format!(" (group {})", module.base.index_group));
    line
}
