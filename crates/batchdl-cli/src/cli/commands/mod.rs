//! CLI command handlers, one file per command.

mod check;
mod config;
mod input;
mod run;

pub use check::run_check;
pub use config::run_show_config;
pub use input::collect_lines;
pub use run::run_batch;
