use thiserror::Error;

use crate::planner::ModuleKind;
use crate::wallet::SnapshotError;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("模块 {module} 执行失败: {message}")]
    Handler { module: ModuleKind, message: String },
    #[error("no handler registered for module `{0}`")]
    MissingHandler(ModuleKind),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("执行已取消")]
    Cancelled,
}

impl ExecutionError {
    pub fn handler(module: &ModuleKind, message: impl Into<String>) -> Self {
        Self::Handler {
            module: module.clone(),
            message: message.into(),
        }
    }
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;
