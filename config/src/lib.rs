//! Groups configuration parsing and validation for the event sync node
//!
//! Options may be given on the command line, through the environment, or in
//! a TOML config file; command line values take precedence over the file

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(unsafe_code)]

mod cli;
mod parsing;
mod validation;

pub use cli::{Cli, SyncNodeConfig};
pub use parsing::{parse_command_line_args, parse_config_from_args, parse_config_from_file};
