//! 计划执行：按钱包顺序调用模块处理器，处理停止规则、延迟与取消。

pub mod error;
pub mod handler;
pub mod runner;

pub use error::{ExecutionError, ExecutionResult};
pub use handler::{
    DryRunHandler, ExecutionContext, HandlerRegistry, ModuleHandler, ModuleOutcome, ModuleStatus,
};
pub use runner::{RunOptions, WalletReport, WalletRunner, run_wallets};
