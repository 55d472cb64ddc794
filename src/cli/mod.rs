//! Command-line interface.

pub mod commands;
pub mod parser;

pub use commands::{execute, load_config, load_config_with};
pub use parser::{Cli, Commands, DecodeArg};
