use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use metrics::{Unit, describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use tracing::info;

use crate::config::PrometheusConfig;

static EXPORTER: OnceCell<SocketAddr> = OnceCell::new();
static PROMETHEUS_ENABLED: AtomicBool = AtomicBool::new(false);

/// 按配置安装 Prometheus exporter；未启用时什么也不做，重复调用只安装一次。
pub fn try_init_prometheus(config: &PrometheusConfig) -> Result<()> {
    if !config.enable {
        return Ok(());
    }
    let addr = EXPORTER.get_or_try_init(|| -> Result<SocketAddr> {
        let addr: SocketAddr = config
            .listen
            .parse()
            .with_context(|| format!("invalid prometheus listen address: {}", config.listen))?;
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install prometheus exporter")?;
        describe_metrics();
        PROMETHEUS_ENABLED.store(true, Ordering::Relaxed);
        Ok(addr)
    })?;
    info!(target: "monitoring", listen = %addr, "Prometheus 指标已启用");
    Ok(())
}

pub fn prometheus_enabled() -> bool {
    PROMETHEUS_ENABLED.load(Ordering::Relaxed)
}

fn describe_metrics() {
    describe_counter!("waypoint_plans_total", "wallet plans built per route");
    describe_histogram!(
        "waypoint_plan_invocations",
        Unit::Count,
        "invocations in a wallet plan"
    );
    describe_counter!("waypoint_module_runs_total", "module invocations by status");
    describe_histogram!(
        "waypoint_module_latency_ms",
        Unit::Milliseconds,
        "module invocation latency"
    );
    describe_counter!("waypoint_module_skipped_total", "module invocations skipped");
    describe_counter!("waypoint_wallets_total", "wallets processed by outcome");
    describe_counter!("waypoint_snapshot_errors_total", "failed snapshot writes");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_is_a_no_op() {
        let config = PrometheusConfig::default();
        try_init_prometheus(&config).unwrap();
        assert!(!prometheus_enabled());
    }
}
