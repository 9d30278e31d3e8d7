use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("模块 {module} 缺少必填字段 `{field}`（默认配置与路线中均未设置）")]
    MissingField { module: String, field: &'static str },
}

pub type PlanResult<T> = Result<T, PlanError>;
