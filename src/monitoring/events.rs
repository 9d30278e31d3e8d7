use std::time::Duration;

use tracing::{info, warn};

use crate::execution::{ModuleStatus, WalletReport};
use crate::planner::PlanSummary;

use super::metrics::prometheus_enabled;
use metrics::{counter, histogram};

pub fn plan_built(route: &str, wallet: &str, summary: &PlanSummary) {
    info!(
        target: "monitoring::plan",
        event = "plan_built",
        route,
        wallet,
        invocations = summary.invocations,
        transactions = summary.transactions,
        reverse_legs = summary.reverse_legs,
        "plan built"
    );

    if prometheus_enabled() {
        let route_label = route.to_string();
        counter!("waypoint_plans_total", "route" => route_label.clone()).increment(1);
        histogram!("waypoint_plan_invocations", "route" => route_label)
            .record(summary.invocations as f64);
    }
}

pub fn module_finished(
    wallet: &str,
    module: &str,
    status: ModuleStatus,
    elapsed: Duration,
    message: Option<&str>,
) {
    let latency_ms = elapsed.as_secs_f64() * 1_000.0;
    match status {
        ModuleStatus::Error | ModuleStatus::Critical => warn!(
            target: "monitoring::module",
            event = "module_finished",
            wallet,
            module,
            status = status.as_str(),
            latency_ms = format_args!("{latency_ms:.3}"),
            detail = message.unwrap_or_default(),
            "module failed"
        ),
        _ => info!(
            target: "monitoring::module",
            event = "module_finished",
            wallet,
            module,
            status = status.as_str(),
            latency_ms = format_args!("{latency_ms:.3}"),
            "module finished"
        ),
    }

    if prometheus_enabled() {
        let module_label = module.to_string();
        counter!(
            "waypoint_module_runs_total",
            "module" => module_label.clone(),
            "status" => status.as_str()
        )
        .increment(1);
        histogram!("waypoint_module_latency_ms", "module" => module_label).record(latency_ms);
    }
}

pub fn module_skipped(wallet: &str, module: &str, reason: &'static str) {
    info!(
        target: "monitoring::module",
        event = "module_skipped",
        wallet,
        module,
        reason,
        "module skipped"
    );

    if prometheus_enabled() {
        counter!(
            "waypoint_module_skipped_total",
            "module" => module.to_string(),
            "reason" => reason
        )
        .increment(1);
    }
}

pub fn wallet_finished(report: &WalletReport) {
    info!(
        target: "monitoring::wallet",
        event = "wallet_finished",
        wallet = %report.wallet_id,
        succeeded = report.succeeded,
        failed = report.failed,
        skipped = report.skipped,
        stopped = report.stopped,
        "wallet finished"
    );

    if prometheus_enabled() {
        let outcome = if report.stopped { "stopped" } else { "completed" };
        counter!("waypoint_wallets_total", "outcome" => outcome).increment(1);
    }
}

pub fn snapshot_write_failed(route: &str, error: &dyn std::fmt::Display) {
    warn!(
        target: "monitoring::snapshot",
        event = "snapshot_write_failed",
        route,
        error = %error,
        "snapshot write failed"
    );

    if prometheus_enabled() {
        counter!("waypoint_snapshot_errors_total", "route" => route.to_string()).increment(1);
    }
}
