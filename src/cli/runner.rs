use anyhow::{Result, anyhow};

use crate::cli::args::{Cli, Command};
use crate::cli::commands::{handle_dry_run_cmd, handle_plan_cmd};
use crate::cli::context::{RunContext, init_configs};
use crate::config::LoadedConfig;

pub async fn run(cli: Cli, loaded: LoadedConfig) -> Result<()> {
    match cli.command {
        Command::Init(args) => init_configs(args),
        Command::Plan(cmd) => {
            let ctx = RunContext::new(loaded)?;
            handle_plan_cmd(cmd, &ctx)
        }
        Command::DryRun(cmd) => {
            crate::monitoring::try_init_prometheus(&loaded.config.execution.prometheus)
                .map_err(|err| anyhow!(err))?;
            let ctx = RunContext::new(loaded)?;
            handle_dry_run_cmd(cmd, &ctx).await
        }
    }
}
