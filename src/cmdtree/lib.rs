//! # Cmdtree Architecture
//!
//! Cmdtree is a **command-tree framework**: applications declare commands and
//! their arguments as plain values, register them in a tree, and hand an
//! argument vector to a dispatcher that resolves, validates, binds and runs
//! exactly one handler.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Embedding binary (cli/ in this crate's demo)               │
//! │  - Owns the process: argv, stdin/stdout, exit code          │
//! │  - Builds the registry and the dispatcher from config       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Dispatch (dispatch.rs)                                     │
//! │  - Resolves the command path, binds tokens, runs handlers   │
//! │  - Maps every failure to an exit status                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Model (schema.rs, coerce.rs, registry.rs)                  │
//! │  - Argument specs, value coercion, the command tree         │
//! │  - Pure data and validation, no I/O                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Services (prompt.rs, render.rs, terminal.rs)               │
//! │  - Prompts and renderers work on an injected Terminal       │
//! │  - StdTerminal (production), MemoryTerminal (testing)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Injected I/O
//!
//! Nothing below the embedding binary touches stdin, stdout or the process exit
//! code. Output and input flow through a [`terminal::Terminal`], and renderers
//! return strings instead of printing. The whole dispatch path, prompts
//! included, is therefore testable with scripted input and captured output.
//!
//! ## Example
//!
//! ```
//! use cmdtree::{ArgumentSpec, CommandNode, CommandRegistry, Dispatcher, ExitStatus};
//! use cmdtree::{MemoryTerminal, PlainRenderer};
//!
//! let mut registry = CommandRegistry::new("demo");
//! registry
//!     .register(
//!         &[],
//!         CommandNode::new("hello")
//!             .arg(ArgumentSpec::option("count").integer().default(1).min(1.0))?
//!             .handler(|ctx, inv| {
//!                 for _ in 0..inv.int("count")? {
//!                     ctx.println("Hello!")?;
//!                 }
//!                 Ok(())
//!             }),
//!     )?;
//!
//! let dispatcher = Dispatcher::new(registry, Box::new(PlainRenderer::new(false)?));
//! let mut term = MemoryTerminal::new();
//! let argv = vec!["hello".to_string(), "--count".to_string(), "2".to_string()];
//! assert_eq!(dispatcher.run(&argv, &mut term), ExitStatus::Success);
//! assert_eq!(term.output(), "Hello!\nHello!\n");
//! # Ok::<(), cmdtree::CliError>(())
//! ```
//!
//! ## Module Overview

pub mod coerce;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod invocation;
pub mod prompt;
pub mod registry;
pub mod render;
pub mod schema;
pub mod styles;
pub mod templates;
pub mod terminal;
pub mod value;

pub use config::{ColorChoice, FrameworkConfig};
pub use dispatch::{Dispatcher, ExitStatus};
pub use error::{CliError, Result};
pub use invocation::{CommandContext, ParsedInvocation};
pub use prompt::Prompter;
pub use registry::{CommandNode, CommandRegistry, Handler};
pub use render::{
    OutputFormat, PlainRenderer, RenderData, RenderRequest, Renderer, StyledRenderer,
};
pub use schema::{ArgKind, ArgumentSet, ArgumentSpec, ValueType};
pub use terminal::{MemoryTerminal, StdTerminal, Terminal};
pub use value::TypedValue;
