//! # Templates
//!
//! Help output is produced from stand-alone minijinja files, embedded here as
//! string constants so the binary carries no runtime template lookup.
//!
//! Templates use explicit line breaks with `{%-` trimming: each emitted line
//! starts with the newline that precedes it. Layout math (column padding) is
//! done in Rust and handed to the template as plain strings; templates only
//! pick styles through the `style` filter.
//!
//! `help.tmp` includes `usage.tmp`, so both must be registered under the names
//! below.

pub const USAGE: &str = "usage.tmp";
pub const HELP: &str = "help.tmp";

pub const USAGE_TEMPLATE: &str = include_str!("templates/usage.tmp");
pub const HELP_TEMPLATE: &str = include_str!("templates/help.tmp");
