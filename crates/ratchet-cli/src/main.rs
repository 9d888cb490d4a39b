//! ratchet CLI.
//!
//! Provides the `ratchet` binary for migrating a TypeScript project onto a
//! stricter compiler configuration one dependency layer at a time:
//!
//! - `auto-add` grows the configuration's accepted set until no eligible
//!   unit checks clean any more
//! - `find-cycles` lists import cycles, which can only be migrated whole
//! - `visualize` writes a per-cluster dump for the graph viewer
//!
//! The compiler path can also be set with `RATCHET_TSC`.

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use ratchet_check::report::{self, DumpFormat};
use ratchet_check::{
    DriverError, MigrationDriver, OracleConfig, OracleError, ReportError, TscOracle,
};
use ratchet_core::{eligible, Condensation, CoreError, DependencyGraph};
use ratchet_resolve::{discover_units, SourceError, TsResolver};
use ratchet_storage::{unit_entry, ConfigStore, InclusionMode, StorageError, TsConfigStore};

/// Incremental strict-mode migration for TypeScript projects.
#[derive(Parser)]
#[command(name = "ratchet", about = "Incremental strict-mode migration for TypeScript projects")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Add every unit that checks clean, repeating until a pass adds nothing.
    AutoAdd {
        /// Path to the strict tsconfig.
        config: PathBuf,

        #[command(flatten)]
        oracle: OracleArgs,

        /// Print the run report as JSON on stdout.
        #[arg(long)]
        json: bool,
    },

    /// List import cycles and the units outside any cycle.
    FindCycles {
        /// Path to the strict tsconfig.
        config: PathBuf,
    },

    /// Report progress and write the per-cluster diagnostic dump.
    Visualize {
        /// Path to the strict tsconfig.
        config: PathBuf,

        /// Submit every eligible cluster to the compiler and record its
        /// error count. Nothing is committed.
        #[arg(long)]
        count_errors: bool,

        /// Output file.
        #[arg(short, long, default_value = "data.js")]
        output: PathBuf,

        /// Output format.
        #[arg(long, value_enum, default_value_t = FormatArg::DataJs)]
        format: FormatArg,

        #[command(flatten)]
        oracle: OracleArgs,
    },
}

/// How to run the compiler.
#[derive(Args)]
struct OracleArgs {
    /// Compiler executable (default: `$RATCHET_TSC`, then
    /// node_modules/typescript/bin/tsc). Relative paths with a directory
    /// part are taken from the config's directory.
    #[arg(long)]
    tsc: Option<PathBuf>,

    /// Run the compiler through this interpreter, e.g. `node`.
    #[arg(long)]
    interpreter: Option<PathBuf>,

    /// Seconds the compiler may take for its initial build.
    #[arg(long, default_value_t = 600)]
    startup_timeout_secs: u64,

    /// Seconds the compiler may take per candidate.
    #[arg(long, default_value_t = 300)]
    submit_timeout_secs: u64,

    /// How candidates and accepted units are written into the config.
    #[arg(long, value_enum, default_value_t = ModeArg::AddToFiles)]
    mode: ModeArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    AddToFiles,
    RemoveFromExclude,
}

impl From<ModeArg> for InclusionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::AddToFiles => InclusionMode::AddToFiles,
            ModeArg::RemoveFromExclude => InclusionMode::RemoveFromExclude,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    DataJs,
    Json,
}

impl From<FormatArg> for DumpFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::DataJs => DumpFormat::DataJs,
            FormatArg::Json => DumpFormat::Json,
        }
    }
}

impl OracleArgs {
    fn to_config(&self, root: &Path) -> OracleConfig {
        let defaults = OracleConfig::default();
        let tsc = self
            .tsc
            .clone()
            .or_else(|| std::env::var_os("RATCHET_TSC").map(PathBuf::from))
            .unwrap_or_else(|| defaults.program.clone());
        let tsc = if tsc.is_relative() && tsc.components().count() > 1 {
            root.join(tsc)
        } else {
            tsc
        };

        let (program, program_args) = match &self.interpreter {
            Some(interpreter) => (
                interpreter.clone(),
                vec![tsc.to_string_lossy().into_owned()],
            ),
            None => (tsc, Vec::new()),
        };

        OracleConfig {
            program,
            program_args,
            startup_timeout: Duration::from_secs(self.startup_timeout_secs),
            submit_timeout: Duration::from_secs(self.submit_timeout_secs),
            mode: self.mode.into(),
            ..defaults
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Source(#[from] SourceError),
    #[error("{0}")]
    Graph(#[from] CoreError),
    #[error("{0}")]
    Oracle(#[from] OracleError),
    #[error("{0}")]
    Driver(#[from] DriverError),
    #[error("{0}")]
    Report(#[from] ReportError),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::AutoAdd {
            config,
            oracle,
            json,
        } => run_auto_add(&config, &oracle, json),
        Commands::FindCycles { config } => run_find_cycles(&config),
        Commands::Visualize {
            config,
            count_errors,
            output,
            format,
            oracle,
        } => run_visualize(&config, count_errors, &output, format.into(), &oracle),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// The configuration store plus the project's graph and condensation.
struct Project {
    store: TsConfigStore,
    graph: DependencyGraph,
    condensation: Condensation,
}

impl Project {
    fn load(config: &Path, mode: InclusionMode) -> Result<Self, CliError> {
        let store = TsConfigStore::open(config)?.with_mode(mode);
        let root = store.root();
        let units = discover_units(root)?;
        let resolver = TsResolver::new(root)?;
        let graph = DependencyGraph::build(units, &resolver)?;
        let condensation = Condensation::build(&graph)?;
        tracing::debug!(
            units = graph.len(),
            edges = graph.edge_count(),
            clusters = condensation.len(),
            warnings = graph.warnings().len(),
            "graph built"
        );
        Ok(Project {
            store,
            graph,
            condensation,
        })
    }

    fn relative(&self, path: &Path) -> String {
        match unit_entry(self.store.root(), path) {
            Some(entry) => entry.trim_start_matches("./").to_string(),
            None => path.display().to_string(),
        }
    }
}

/// Execute the auto-add subcommand.
fn run_auto_add(config: &Path, args: &OracleArgs, json: bool) -> Result<(), CliError> {
    let project = Project::load(config, args.mode.into())?;
    let oracle = TscOracle::new(project.store.path(), args.to_config(project.store.root()))?;

    let mut driver = MigrationDriver::new(
        &project.graph,
        &project.condensation,
        project.store.clone(),
        oracle,
    )
    .with_root(project.store.root());
    let report = driver.run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let added = report.accepted_clusters().count();
        println!(
            "Added {} cluster(s) in {} pass(es); {}/{} units now checked",
            added, report.passes, report.accepted_units, report.total_units
        );
    }
    Ok(())
}

/// Execute the find-cycles subcommand.
fn run_find_cycles(config: &Path) -> Result<(), CliError> {
    let project = Project::load(config, InclusionMode::default())?;

    let mut singles = Vec::new();
    let mut cycle_count = 0;
    for cluster in project.condensation.clusters() {
        let mut files: Vec<String> = project
            .condensation
            .member_paths(&project.graph, cluster.id)?
            .into_iter()
            .map(|p| project.relative(p))
            .collect();
        files.sort();

        if cluster.is_cycle() {
            println!("Found import cycle of {} units", files.len());
            for file in &files {
                println!("    {}", file);
            }
            cycle_count += 1;
        } else {
            singles.extend(files);
        }
    }

    println!("Found {} import cycle(s)", cycle_count);
    println!("Units outside any cycle ({})", singles.len());
    singles.sort();
    for file in &singles {
        println!("    {}", file);
    }
    Ok(())
}

/// Execute the visualize subcommand.
fn run_visualize(
    config: &Path,
    count_errors: bool,
    output: &Path,
    format: DumpFormat,
    args: &OracleArgs,
) -> Result<(), CliError> {
    let project = Project::load(config, args.mode.into())?;
    let accepted = project.store.read_accepted_set()?;

    let progress = report::progress(&project.graph, &project.condensation, &accepted);
    println!(
        "Current progress {}/{}",
        progress.accepted_units, progress.total_units
    );
    println!("Current eligible unit count: {}", progress.eligible_units);

    let counts = if count_errors {
        let mut oracle =
            TscOracle::new(project.store.path(), args.to_config(project.store.root()))?;
        let frontier = eligible(&project.graph, &project.condensation, &accepted);
        report::count_errors(&mut oracle, &project.graph, &project.condensation, &frontier)?
    } else {
        Default::default()
    };

    let nodes = report::build_nodes(
        &project.graph,
        &project.condensation,
        &accepted,
        project.store.root(),
        &counts,
    )?;
    report::write_dump(output, &nodes, format)?;
    println!("Wrote {} node(s) to {}", nodes.len(), output.display());
    Ok(())
}
