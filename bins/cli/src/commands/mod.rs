//! CLI command handlers.

pub mod check;
pub mod config;
pub mod info;
pub mod phone;

pub use check::{CheckCommandInput, run_check};
pub use config::{ConfigShowFormat, run_config_check, run_config_show};
pub use info::run_info;
pub use phone::run_format_phone;
