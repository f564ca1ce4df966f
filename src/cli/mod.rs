//! Command-line interface components
//!
//! This module contains CLI-specific code for relkit, including argument
//! parsing and the per-subcommand handlers.

pub mod args;
pub mod commands;

pub use args::{
    CheckArgs, Cli, Commands, DiffArgs, DiffFormat, GlobalArgs, PublishArgs, SweepArgs,
    ValidateArgs,
};
pub use commands::{handle_check, handle_diff, handle_publish, handle_sweep, handle_validate};
