//! Panel genes as BED.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use crate::common::contig::ContigSet;
use crate::emit::{self, OrderedEmitter};
use crate::error::require_inputs;
use crate::panel::{read_panel, Exclusions, PanelResolver};
use crate::tables::read_gene_table;

/// Command line arguments for `panel gene-bed` sub command.
#[derive(Parser, Debug)]
#[command(about = "Write BED file of panel genes", long_about = None)]
pub struct Args {
    /// Path to the panel gene list.
    #[arg(long)]
    pub path_panel: PathBuf,
    /// Path to `ensembl_gene_data.tsv`.
    #[arg(long)]
    pub path_ensembl_gene_data: PathBuf,
    /// Path to `refseq_gene_data.tsv`.
    #[arg(long)]
    pub path_refseq_gene_data: PathBuf,
    /// Path to YAML file with genes known to be missing; defaults to the Ensembl 105 set.
    #[arg(long)]
    pub path_exclusions: Option<PathBuf>,
    /// Path to the output BED file, gzip compressed if ending in `.gz`.
    #[arg(long)]
    pub path_output: PathBuf,
}

/// Main entry point for `panel gene-bed` sub command.
pub fn run(common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!(
        "Writing panel gene BED\ncommon args: {:#?}\nargs: {:#?}",
        common,
        args
    );
    require_inputs(
        [
            &args.path_panel,
            &args.path_ensembl_gene_data,
            &args.path_refseq_gene_data,
        ]
        .into_iter()
        .chain(args.path_exclusions.as_ref()),
    )?;
    let start = Instant::now();

    let exclusions = Exclusions::load(args.path_exclusions.as_deref())?;
    let panel = read_panel(&args.path_panel)?;
    let ensembl = read_gene_table(&args.path_ensembl_gene_data)?;
    let refseq = read_gene_table(&args.path_refseq_gene_data)?;

    let genes = PanelResolver::new(&exclusions).genes(&panel, &ensembl, &refseq)?;
    let count = OrderedEmitter::new(ContigSet::WithMitochondrion).emit(
        &args.path_output,
        None,
        genes,
        emit::panel_gene_bed_row,
    )?;

    tracing::info!("Done writing {} panel genes in {:?}", count, start.elapsed());
    Ok(())
}
