//! APPRIS transcripts of the panel genes as BED.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use crate::annotation::Source;
use crate::common::contig::ContigSet;
use crate::emit::{self, OrderedEmitter};
use crate::error::require_inputs;
use crate::panel::{read_panel, Exclusions, PanelResolver};
use crate::tables::read_transcript_bed;

/// Command line arguments for `panel transcript-bed` sub command.
#[derive(Parser, Debug)]
#[command(about = "Write BED file of panel gene transcripts", long_about = None)]
pub struct Args {
    /// Source of the transcript table, selects the panel gene ID column to match.
    #[arg(long, value_enum, default_value_t = Source::Ensembl)]
    pub source: Source,
    /// Path to the panel gene list.
    #[arg(long)]
    pub path_panel: PathBuf,
    /// Path to `<source>.transcripts.bed` as written by `compile annotations`.
    #[arg(long)]
    pub path_transcripts: PathBuf,
    /// Path to YAML file with genes known to be missing; defaults to the Ensembl 105 set.
    #[arg(long)]
    pub path_exclusions: Option<PathBuf>,
    /// Path to the output BED file, gzip compressed if ending in `.gz`.
    #[arg(long)]
    pub path_output: PathBuf,
}

/// Main entry point for `panel transcript-bed` sub command.
pub fn run(common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!(
        "Writing panel transcript BED\ncommon args: {:#?}\nargs: {:#?}",
        common,
        args
    );
    require_inputs(
        [&args.path_panel, &args.path_transcripts]
            .into_iter()
            .chain(args.path_exclusions.as_ref()),
    )?;
    let start = Instant::now();

    let exclusions = Exclusions::load(args.path_exclusions.as_deref())?;
    let panel = read_panel(&args.path_panel)?;
    let transcripts = read_transcript_bed(&args.path_transcripts)?;

    let transcripts = PanelResolver::new(&exclusions).transcripts(&panel, args.source, transcripts)?;
    let count = OrderedEmitter::new(ContigSet::Nuclear).emit(
        &args.path_output,
        None,
        transcripts,
        emit::panel_transcript_bed_row,
    )?;

    tracing::info!("Done writing {} panel transcripts in {:?}", count, start.elapsed());
    Ok(())
}
