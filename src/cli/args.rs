use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "waypoint", version, about = "多钱包链上模块路线规划与执行")]
pub struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径（默认查找 waypoint.yaml 或 config/waypoint.yaml）"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 为钱包列表生成路线计划并打印
    Plan(PlanCmd),
    /// 按计划执行路线（dry-run 模式，不发送交易）
    #[command(name = "dry-run")]
    DryRun(DryRunCmd),
    /// 初始化配置模版文件
    Init(InitCmd),
}

#[derive(Args, Debug)]
pub struct PlanCmd {
    #[arg(value_name = "ROUTE", help = "路线名称（routes_dir 下的文件名）或路线文件路径")]
    pub route: String,
    #[arg(long, help = "以 JSON 输出完整计划")]
    pub json: bool,
    #[arg(long, help = "将计划保存为快照，供 dry-run --resume 使用")]
    pub save: bool,
}

#[derive(Args, Debug)]
pub struct DryRunCmd {
    #[arg(value_name = "ROUTE", help = "路线名称（routes_dir 下的文件名）或路线文件路径")]
    pub route: String,
    #[arg(long, help = "继续执行未完成的快照，而不是重新规划")]
    pub resume: bool,
    #[arg(long, help = "跳过模块之间的等待")]
    pub no_delay: bool,
}

#[derive(Args, Debug)]
pub struct InitCmd {
    #[arg(long, value_name = "DIR", help = "可选输出目录（默认当前目录）")]
    pub output: Option<PathBuf>,
    #[arg(long, help = "若文件存在则覆盖")]
    pub force: bool,
}
