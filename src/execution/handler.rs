use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::error::{ExecutionError, ExecutionResult};
use crate::planner::{ModuleKind, TransformedModuleConfig};
use crate::wallet::WalletData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleStatus {
    Success,
    /// 条件不满足而未执行（余额足够、已领取等），不算失败。
    Passed,
    Warning,
    Error,
    /// 钱包无法继续执行后续模块。
    Critical,
}

impl ModuleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleStatus::Success => "success",
            ModuleStatus::Passed => "passed",
            ModuleStatus::Warning => "warning",
            ModuleStatus::Error => "error",
            ModuleStatus::Critical => "critical",
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, ModuleStatus::Error | ModuleStatus::Critical)
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOutcome {
    pub status: ModuleStatus,
    pub message: Option<String>,
}

impl ModuleOutcome {
    pub fn success() -> Self {
        Self {
            status: ModuleStatus::Success,
            message: None,
        }
    }

    pub fn with_message(status: ModuleStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    pub fn passed(message: impl Into<String>) -> Self {
        Self::with_message(ModuleStatus::Passed, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_message(ModuleStatus::Error, message)
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self::with_message(ModuleStatus::Critical, message)
    }
}

/// 一次调用的上下文：当前钱包与该模块内的第几次重复（从 1 开始）。
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub wallet: &'a WalletData,
    pub repetition: u32,
    pub total: u32,
}

#[async_trait]
pub trait ModuleHandler: Send + Sync {
    async fn execute(
        &self,
        ctx: &ExecutionContext<'_>,
        module: &TransformedModuleConfig,
    ) -> ExecutionResult<ModuleOutcome>;
}

/// 模块类型到处理器的映射，未注册的类型交给 fallback。
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<ModuleKind, Arc<dyn ModuleHandler>>,
    fallback: Option<Arc<dyn ModuleHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有模块都交给同一个处理器。
    pub fn with_fallback(handler: Arc<dyn ModuleHandler>) -> Self {
        Self {
            handlers: BTreeMap::new(),
            fallback: Some(handler),
        }
    }

    pub fn register(&mut self, kind: ModuleKind, handler: Arc<dyn ModuleHandler>) -> &mut Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn set_fallback(&mut self, handler: Arc<dyn ModuleHandler>) -> &mut Self {
        self.fallback = Some(handler);
        self
    }

    pub fn resolve(&self, kind: &ModuleKind) -> ExecutionResult<Arc<dyn ModuleHandler>> {
        self.handlers
            .get(kind)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| ExecutionError::MissingHandler(kind.clone()))
    }

    /// 在执行前确认计划中的每种模块都有处理器。
    pub fn ensure_covers<'a, I>(&self, kinds: I) -> ExecutionResult<()>
    where
        I: IntoIterator<Item = &'a ModuleKind>,
    {
        if self.fallback.is_some() {
            return Ok(());
        }
        for kind in kinds {
            if !self.handlers.contains_key(kind) {
                return Err(ExecutionError::MissingHandler(kind.clone()));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// 只打印调用内容，不发送任何交易。
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunHandler;

#[async_trait]
impl ModuleHandler for DryRunHandler {
    async fn execute(
        &self,
        ctx: &ExecutionContext<'_>,
        module: &TransformedModuleConfig,
    ) -> ExecutionResult<ModuleOutcome> {
        let amount = module
            .amount
            .map(|amount| {
                if amount.percent {
                    format!("{:.2}%", amount.value)
                } else {
                    format!("{}", amount.value)
                }
            })
            .unwrap_or_else(|| "-".to_string());
        info!(
            target: "execution::dry_run",
            wallet = ctx.wallet.display_name(),
            module = %module.describe(),
            repetition = ctx.repetition,
            total = ctx.total,
            amount = %amount,
            "[dry-run] 跳过实际执行"
        );
        Ok(ModuleOutcome::passed("dry run"))
    }
}
