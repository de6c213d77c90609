//! CLI module
//!
//! Command-line interface for the operator controls.
//!
//! # Commands
//!
//! - `profiles` - List built-in profiles
//! - `check` - Verify warehouse and staging access
//! - `preview` - Read and coerce one file without loading it
//! - `enqueue` - Start a session over a file queue
//! - `step` / `run` - Process one file, or loop until done
//! - `status` / `reset` - Inspect or clear progress
//! - `serve` - Start HTTP server mode

mod commands;
mod pipeline;
mod runner;
mod server;

pub use commands::{Cli, Commands, OutputFormat};
pub use pipeline::{resolve_profile, Pipeline};
pub use runner::Runner;
pub use server::{serve, ServerConfig};
