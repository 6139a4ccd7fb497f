//! Main entry point for the panelcoords CLI.

use std::process::ExitCode;

use clap::{command, Args, Parser, Subcommand};

use panelcoords::error::{Error, EXIT_FATAL};
use panelcoords::{common, compile, panel};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Canonical gene, transcript, and CDS coordinate tables for gene panels"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Compile canonical tables from annotation files.
    Compile(Compile),
    /// Resolve a gene panel against the canonical tables.
    Panel(Panel),
}

/// Parsing of "compile *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Compile {
    /// The sub command to run
    #[command(subcommand)]
    command: CompileCommands,
}

/// Enum supporting the parsing of "compile *" sub commands.
#[derive(Debug, Subcommand)]
enum CompileCommands {
    Annotations(compile::annotations::Args),
    EnsemblCanonical(compile::ensembl::Args),
    RefseqMane(compile::refseq::Args),
}

/// Parsing of "panel *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Panel {
    /// The sub command to run
    #[command(subcommand)]
    command: PanelCommands,
}

/// Enum supporting the parsing of "panel *" sub commands.
#[derive(Debug, Subcommand)]
enum PanelCommands {
    GeneBed(panel::gene_bed::Args),
    TranscriptBed(panel::transcript_bed::Args),
    CdsBed(panel::cds_bed::Args),
    DriverGenes(panel::driver_genes::Args),
}

fn run(cli: &Cli) -> Result<(), anyhow::Error> {
    match &cli.command {
        Commands::Compile(compile) => match &compile.command {
            CompileCommands::Annotations(args) => compile::annotations::run(&cli.common, args)?,
            CompileCommands::EnsemblCanonical(args) => compile::ensembl::run(&cli.common, args)?,
            CompileCommands::RefseqMane(args) => compile::refseq::run(&cli.common, args)?,
        },
        Commands::Panel(panel) => match &panel.command {
            PanelCommands::GeneBed(args) => panel::gene_bed::run(&cli.common, args)?,
            PanelCommands::TranscriptBed(args) => panel::transcript_bed::run(&cli.common, args)?,
            PanelCommands::CdsBed(args) => panel::cds_bed::run(&cli.common, args)?,
            PanelCommands::DriverGenes(args) => panel::driver_genes::run(&cli.common, args)?,
        },
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // Install collector and go into sub commands.
    tracing::subscriber::with_default(collector, || {
        tracing::info!("panelcoords {} startup", common::version());

        match run(&cli) {
            Ok(()) => {
                tracing::info!("All done. Have a nice day!");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("ERROR: {:#}", err);
                ExitCode::from(
                    err.downcast_ref::<Error>()
                        .map(Error::exit_code)
                        .unwrap_or(EXIT_FATAL),
                )
            }
        }
    })
}
