//! CLI command implementations.

mod ask;
mod browse;
mod config;
mod doctor;
mod evals;
mod serve;

pub use ask::run_ask;
pub use browse::run_browse;
pub use config::run_config;
pub use doctor::run_doctor;
pub use evals::run_evals;
pub use serve::run_serve;
