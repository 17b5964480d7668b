//! # CLI Layer
//!
//! The demo binary: **one possible embedding** of the cmdtree library.
//!
//! This is the only place that:
//! - Reads the process argument vector
//! - Owns stdin/stdout/stderr (through [`cmdtree::StdTerminal`])
//! - Turns the dispatch outcome into a process exit code
//!
//! ## Launcher flags vs command arguments
//!
//! A small clap parser in `setup` handles process-level flags (`--color`,
//! `--config-dir`) that must be known before the dispatcher is built. Every
//! other token, including `--help` and `--version`, is passed through untouched
//! to the command tree.
//!
//! ## Module Structure
//!
//! - `setup`: launcher flags (clap) and logging
//! - `commands`: the demo command tree and the `run` entry point
//! - `handlers`: command bodies

mod commands;
mod handlers;
pub mod setup;

pub use commands::run;
