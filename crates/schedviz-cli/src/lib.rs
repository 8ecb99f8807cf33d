//! Scheduler latency viewer CLI library.
//!
//! This crate hosts the `schedviz-core` engine: it loads trace dumps, owns
//! the event store and prints what the engine draws.

mod cli;
pub mod commands;
mod config;
pub mod trace_file;

pub use cli::{Cli, Commands, ViewArgs};
pub use config::{Config, GraphConfig};
pub use trace_file::LoadedTrace;
