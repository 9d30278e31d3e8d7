pub mod events;
pub mod metrics;

pub use metrics::{prometheus_enabled, try_init_prometheus};
