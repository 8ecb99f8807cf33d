//! CLI subcommand implementations.

pub mod correct;
pub mod intervals;
pub mod pick;
mod util;
