//! beliefmap: grow a tree of beliefs around a protected core.

mod commands;
mod manifest;

use std::path::PathBuf;
use std::process;

use beliefmap_core::{BeliefStatus, Mode, Verdict};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Workspace;

#[derive(Parser)]
#[command(name = "beliefmap", version, about = "Grow and audit belief maps")]
struct Cli {
    /// Log classifier and store activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    /// State file to use instead of the one named in beliefmap.toml
    #[arg(long, global = true, value_name = "PATH")]
    state: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new map around a core belief
    Init {
        /// The core belief
        core: String,
        /// sandbox or professional (default: manifest, then sandbox)
        #[arg(long)]
        mode: Option<Mode>,
        #[arg(long)]
        notes: Option<String>,
        /// 0-100 (default: 100)
        #[arg(long)]
        confidence: Option<u8>,
        /// Replace an existing map
        #[arg(long)]
        force: bool,
    },
    /// Add a belief and classify it
    Add {
        text: String,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, default_value_t = commands::grow::DEFAULT_CONFIDENCE)]
        confidence: u8,
        /// Parent belief ID or prefix (default: the selected belief)
        #[arg(long)]
        parent: Option<String>,
        /// Assign this status instead of asking the classifier
        #[arg(long)]
        verdict: Option<Verdict>,
    },
    /// Classify a belief again (default: the belief blocking growth)
    Reanalyze {
        id: Option<String>,
        #[arg(long)]
        verdict: Option<Verdict>,
    },
    /// Choose where new beliefs attach (no ID: the core)
    Select { id: Option<String> },
    /// Change a belief's notes or confidence
    Edit {
        id: String,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        confidence: Option<u8>,
    },
    /// Reword a belief
    Revise { id: String, text: String },
    /// Roll back the last insertion (sandbox only)
    Undo,
    /// Show one belief in detail
    Show { id: String },
    /// List beliefs as a tree
    List {
        /// Only beliefs with this status
        #[arg(long)]
        status: Option<BeliefStatus>,
    },
    /// Summarize statuses and the growth block
    Status,
    /// Compute the radial layout
    Layout {
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Write the map as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the map with an exported JSON record
    Import { path: PathBuf },
    /// Delete the map
    Reset,
    /// Propose a next belief (sandbox only)
    Suggest,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(fmt::layer().without_time().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let ws = Workspace::discover(&cwd, cli.state.as_deref())?;

    match cli.command {
        Commands::Init {
            core,
            mode,
            notes,
            confidence,
            force,
        } => commands::init::run(&ws, &core, mode, notes.as_deref(), confidence, force),

        Commands::Add {
            text,
            notes,
            confidence,
            parent,
            verdict,
        } => commands::grow::add(
            &ws,
            &text,
            notes.as_deref(),
            confidence,
            parent.as_deref(),
            verdict,
        ),

        Commands::Reanalyze { id, verdict } => {
            commands::grow::reanalyze(&ws, id.as_deref(), verdict)
        }
        Commands::Suggest => commands::grow::suggest(&ws),

        Commands::Select { id } => commands::revise::select(&ws, id.as_deref()),
        Commands::Edit {
            id,
            notes,
            confidence,
        } => commands::revise::edit(&ws, &id, notes.as_deref(), confidence),
        Commands::Revise { id, text } => commands::revise::revise(&ws, &id, &text),
        Commands::Undo => commands::revise::undo(&ws),
        Commands::Reset => commands::revise::reset(&ws),

        Commands::Show { id } => commands::inspect::show(&ws, &id),
        Commands::List { status } => commands::inspect::list(&ws, status),
        Commands::Status => commands::inspect::status(&ws),
        Commands::Layout {
            width,
            height,
            format,
        } => commands::inspect::layout(&ws, width, height, format == Format::Json),

        Commands::Export { output } => commands::transfer::export(&ws, output.as_deref()),
        Commands::Import { path } => commands::transfer::import(&ws, &path),
    }
}
