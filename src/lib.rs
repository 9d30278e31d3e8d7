//! 多钱包链上模块路线的规划与执行。

pub mod cli;
pub mod config;
pub mod execution;
pub mod monitoring;
pub mod planner;
pub mod wallet;
