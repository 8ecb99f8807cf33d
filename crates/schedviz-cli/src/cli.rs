//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Scheduler latency viewer.
///
/// Loads a decoded trace dump, repairs the task attribution of events
/// trailing `sched_switch`, and shows wake-up latency and preemption
/// intervals of a task.
#[derive(Debug, Parser)]
#[command(name = "schedviz", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the correction pass and list the entries it rewrote.
    Correct {
        /// Trace dump (JSON Lines).
        trace: PathBuf,

        /// Output as JSON Lines.
        #[arg(long)]
        json: bool,
    },

    /// List the wake-up latency and preemption intervals of a task.
    Intervals {
        #[command(flatten)]
        view: ViewArgs,

        /// Output as JSON Lines.
        #[arg(long)]
        json: bool,
    },

    /// Double-click the interval under a point and show the markers placed.
    Pick {
        #[command(flatten)]
        view: ViewArgs,

        /// X coordinate of the click.
        #[arg(long, allow_negative_numbers = true)]
        x: i32,

        /// Y coordinate of the click.
        #[arg(long, allow_negative_numbers = true)]
        y: i32,
    },
}

/// The trace, task and time window to draw.
#[derive(Debug, Clone, Args)]
pub struct ViewArgs {
    /// Trace dump (JSON Lines).
    pub trace: PathBuf,

    /// Task to draw.
    #[arg(long)]
    pub pid: i32,

    /// Start of the visible range (defaults to the first event).
    #[arg(long)]
    pub min: Option<u64>,

    /// End of the visible range (defaults to the last event).
    #[arg(long)]
    pub max: Option<u64>,
}
