//! Command implementations and argument parsing for the popgraph CLI.

use std::io::{self, Write};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use popgraph_core::{
    DegreeStats, EncodedGeometry, Geometry, GeometryBuilder, GeometryError, InitReport, Layout,
    Layout2D, Layout3D, LayoutConfig, LayoutError, LayoutListener, LayoutProgress, LayoutStatus,
    Termination, Vector,
};
use rand::{SeedableRng, rngs::SmallRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Span, debug, field, info, instrument, warn};

const DEFAULT_SEED: u64 = 1;
const DEFAULT_LAYOUT_TIMEOUT_MS: u64 = 5_000;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "popgraph", about = "Generate and inspect population structures.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Generate a geometry and report its structure.
    Generate(GenerateCommand),
}

/// Options accepted by the `generate` command.
#[derive(Debug, Args, Clone)]
pub struct GenerateCommand {
    /// Geometry descriptor, for example `n`, `r4`, `Hc2,5` or `+3,4`.
    #[arg(long)]
    pub geometry: String,

    /// Requested population size; snapped to the nearest feasible value.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub size: usize,

    /// Seed for the generator's random stream.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Probability of rewiring each link (overrides the descriptor).
    #[arg(long)]
    pub rewire: Option<f64>,

    /// Probability of adding a random link per existing link (overrides the
    /// descriptor).
    #[arg(long)]
    pub add: Option<f64>,

    /// Allow self-loops so individuals interact with their own site.
    #[arg(long = "inter-species")]
    pub inter_species: bool,

    /// Compute a force-directed layout after generation.
    #[arg(long, value_enum, default_value_t = LayoutMode::None)]
    pub layout: LayoutMode,

    /// Wall-clock budget for the layout relaxation.
    #[arg(long = "layout-timeout-ms", default_value_t = DEFAULT_LAYOUT_TIMEOUT_MS)]
    pub layout_timeout_ms: u64,

    /// Output format of the summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Run the structural invariant checks and report violations.
    #[arg(long)]
    pub check: bool,
}

/// Dimension of the optional layout.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum)]
pub enum LayoutMode {
    /// Skip layout.
    #[default]
    None,
    /// Planar layout.
    #[value(name = "2d")]
    TwoD,
    /// Spatial layout.
    #[value(name = "3d")]
    ThreeD,
}

/// Rendering of [`ExecutionSummary`].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Line-oriented text.
    #[default]
    Human,
    /// The summary and the persisted encoding as one JSON document.
    Json,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Geometry construction failed.
    #[error(transparent)]
    Core(#[from] GeometryError),
    /// Layout configuration or execution failed.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Degree statistics as reported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DegreeSummary {
    /// Smallest out-degree.
    pub min_out: usize,
    /// Largest out-degree.
    pub max_out: usize,
    /// Average out-degree.
    pub avg_out: f64,
    /// Smallest in-degree.
    pub min_in: usize,
    /// Largest in-degree.
    pub max_in: usize,
    /// Average in-degree.
    pub avg_in: f64,
}

impl From<DegreeStats> for DegreeSummary {
    fn from(stats: DegreeStats) -> Self {
        Self {
            min_out: stats.min_out,
            max_out: stats.max_out,
            avg_out: stats.avg_out,
            min_in: stats.min_in,
            max_in: stats.max_in,
            avg_in: stats.avg_in,
        }
    }
}

/// Layout results included in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutSummary {
    /// Number of dimensions laid out.
    pub dimensions: usize,
    /// Final layout status.
    pub status: LayoutStatus,
    /// Why the relaxation stopped.
    pub termination: Termination,
    /// Sweeps performed.
    pub sweeps: usize,
    /// Links drawn.
    pub visible_links: usize,
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSummary {
    /// Resolved descriptor, including corrected parameters.
    pub descriptor: String,
    /// Resolved population size.
    pub size: usize,
    /// Family code of the resolved geometry.
    pub family: String,
    /// Resolved connectivity.
    pub connectivity: f64,
    /// The requested size was adjusted, so a simulation would need a reset.
    pub requires_reset: bool,
    /// Generation failed and the population fell back to well-mixed.
    pub fell_back: bool,
    /// Whether links are stored symmetrically.
    pub undirected: bool,
    /// Degree statistics.
    pub degrees: DegreeSummary,
    /// Invariant violations; `None` when checks were not requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<String>>,
    /// Layout results; `None` when no layout was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutSummary>,
    /// Persisted encoding, attached for JSON output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<EncodedGeometry>,
    /// Format requested on the command line.
    #[serde(skip)]
    pub format: OutputFormat,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when the geometry or layout cannot be built.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use popgraph_cli::cli::{Cli, Command, GenerateCommand, LayoutMode, OutputFormat, run_cli};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let cli = Cli {
///     command: Command::Generate(GenerateCommand {
///         geometry: "n".into(),
///         size: 99,
///         seed: 1,
///         rewire: None,
///         add: None,
///         inter_species: false,
///         layout: LayoutMode::None,
///         layout_timeout_ms: 100,
///         format: OutputFormat::Human,
///         check: true,
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.size, 100);
/// assert!(summary.requires_reset);
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Generate(generate) => {
            Span::current().record("command", field::display("generate"));
            run_generate(&generate)
        }
    }
}

#[instrument(
    name = "cli.generate",
    err,
    skip(command),
    fields(geometry = %command.geometry, size = command.size, seed = command.seed),
)]
pub(super) fn run_generate(command: &GenerateCommand) -> Result<ExecutionSummary, CliError> {
    let mut builder = GeometryBuilder::new()
        .with_descriptor(&command.geometry)
        .with_size(command.size)
        .with_interspecies(command.inter_species);
    if let Some(rewire) = command.rewire {
        builder = builder.with_rewire(rewire);
    }
    if let Some(add) = command.add {
        builder = builder.with_add(add);
    }
    let mut rng = SmallRng::seed_from_u64(command.seed);
    let (geometry, report) = builder.build_with_report(&mut rng)?;

    let violations = command.check.then(|| check_invariants(&geometry));
    let layout = match command.layout {
        LayoutMode::None => None,
        LayoutMode::TwoD => Some(run_layout(
            Layout2D::new(layout_config(command))?,
            &geometry,
        )?),
        LayoutMode::ThreeD => Some(run_layout(
            Layout3D::new(layout_config(command))?,
            &geometry,
        )?),
    };
    let encoding = (command.format == OutputFormat::Json).then(|| geometry.encode());

    let summary = summarise(&geometry, &report, violations, layout, encoding, command.format);
    info!(
        family = summary.family.as_str(),
        size = summary.size,
        connectivity = summary.connectivity,
        "command completed"
    );
    Ok(summary)
}

fn layout_config(command: &GenerateCommand) -> LayoutConfig {
    LayoutConfig::default()
        .with_timeout(Duration::from_millis(command.layout_timeout_ms))
        .with_seed(command.seed)
}

/// Logs sweep progress at debug level.
#[derive(Debug, Default)]
struct ProgressLogger;

impl LayoutListener for ProgressLogger {
    fn on_progress(&mut self, progress: &LayoutProgress) {
        debug!(
            sweep = progress.sweep,
            potential = progress.potential,
            delta = progress.delta,
            "layout sweep"
        );
    }
}

#[instrument(name = "cli.layout", err, skip(layout, geometry), fields(dim = V::DIM))]
pub(super) fn run_layout<V: Vector>(
    mut layout: Layout<V>,
    geometry: &Geometry,
) -> Result<LayoutSummary, CliError> {
    let outcome = layout.run(geometry, &mut ProgressLogger)?;
    Ok(LayoutSummary {
        dimensions: V::DIM,
        status: outcome.status,
        termination: outcome.termination,
        sweeps: outcome.sweeps,
        visible_links: outcome.visible_links,
    })
}

pub(super) fn check_invariants(geometry: &Geometry) -> Vec<String> {
    let violations: Vec<String> = geometry
        .invariants()
        .collect_all()
        .iter()
        .map(ToString::to_string)
        .collect();
    for violation in &violations {
        warn!(violation = violation.as_str(), "geometry invariant violated");
    }
    violations
}

pub(super) fn summarise(
    geometry: &Geometry,
    report: &InitReport,
    violations: Option<Vec<String>>,
    layout: Option<LayoutSummary>,
    encoding: Option<EncodedGeometry>,
    format: OutputFormat,
) -> ExecutionSummary {
    ExecutionSummary {
        descriptor: geometry.descriptor().to_string(),
        size: geometry.size(),
        family: geometry.family().to_string(),
        connectivity: geometry.connectivity(),
        requires_reset: report.requires_reset(),
        fell_back: report.fell_back,
        undirected: geometry.is_undirected(),
        degrees: geometry.stats().into(),
        violations,
        layout,
        encoding,
        format,
    }
}

/// Renders `summary` to `writer` in the format it was requested in.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails or the
/// summary cannot be serialised.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use popgraph_cli::cli::{Cli, Command, GenerateCommand, LayoutMode, OutputFormat, render_summary, run_cli};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let cli = Cli {
///     command: Command::Generate(GenerateCommand {
///         geometry: "m".into(),
///         size: 49,
///         seed: 1,
///         rewire: None,
///         add: None,
///         inter_species: false,
///         layout: LayoutMode::None,
///         layout_timeout_ms: 100,
///         format: OutputFormat::Human,
///         check: false,
///     }),
/// };
/// let mut buffer = Vec::new();
/// render_summary(&run_cli(cli)?, &mut buffer)?;
/// assert!(String::from_utf8(buffer)?.starts_with("geometry: m\n"));
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, summary)?;
            writeln!(writer)
        }
        OutputFormat::Human => render_human(summary, writer),
    }
}

fn render_human(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "geometry: {}", summary.descriptor)?;
    writeln!(writer, "family: {}", summary.family)?;
    writeln!(writer, "size: {}", summary.size)?;
    writeln!(writer, "connectivity: {}", summary.connectivity)?;
    writeln!(writer, "reset required: {}", summary.requires_reset)?;
    if summary.fell_back {
        writeln!(writer, "generation failed: fell back to well-mixed")?;
    }
    let degrees = &summary.degrees;
    writeln!(
        writer,
        "out-degree: min {} max {} avg {:.3}",
        degrees.min_out, degrees.max_out, degrees.avg_out
    )?;
    writeln!(
        writer,
        "in-degree: min {} max {} avg {:.3}",
        degrees.min_in, degrees.max_in, degrees.avg_in
    )?;
    if let Some(violations) = &summary.violations {
        if violations.is_empty() {
            writeln!(writer, "invariants: ok")?;
        } else {
            writeln!(writer, "invariants: {} violated", violations.len())?;
            for violation in violations {
                writeln!(writer, "\t{violation}")?;
            }
        }
    }
    if let Some(layout) = &summary.layout {
        writeln!(
            writer,
            "layout ({}d): {:?} after {} sweeps ({:?}), {} visible links",
            layout.dimensions, layout.status, layout.sweeps, layout.termination, layout.visible_links
        )?;
    }
    Ok(())
}
