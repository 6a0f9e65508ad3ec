//! CLI command implementations

mod config;
mod exchange;

pub use config::{config_init, config_path, config_show, resolve_config};
pub use exchange::{operator_command, parse_properties, send_command, write_objects};
