//! Command-line interface orchestration for popgraph.
//!
//! The `generate` command builds a geometry from a descriptor, optionally
//! checks its structural invariants and lays it out, and reports the result
//! either as text or as JSON carrying the persisted encoding.

mod commands;

pub use commands::{
    Cli, CliError, Command, DegreeSummary, ExecutionSummary, GenerateCommand, LayoutMode,
    LayoutSummary, OutputFormat, render_summary, run_cli,
};
