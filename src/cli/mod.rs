pub mod cli;
pub mod config;

pub use cli::{Cli, run, run_from_args};
pub use config::{DEFAULT_CONFIG_FILE, FileConfig, build_config, load_config, load_config_or_default};
