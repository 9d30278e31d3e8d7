pub mod dry_run;
pub mod plan;

pub use dry_run::handle_dry_run_cmd;
pub use plan::handle_plan_cmd;
