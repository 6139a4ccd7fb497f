//! CDS of the panel genes' canonical transcripts as BED.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use indexmap::IndexMap;

use crate::common::contig::ContigSet;
use crate::emit::{self, OrderedEmitter};
use crate::error::require_inputs;
use crate::panel::{read_panel, Exclusions, PanelResolver};
use crate::tables::{group_cds, read_cds_table, read_gene_table};

/// Command line arguments for `panel cds-bed` sub command.
#[derive(Parser, Debug)]
#[command(about = "Write BED file of panel gene coding sequences", long_about = None)]
pub struct Args {
    /// Path to the panel gene list.
    #[arg(long)]
    pub path_panel: PathBuf,
    /// Path to `ensembl_cds_data.tsv`.
    #[arg(long)]
    pub path_ensembl_cds_data: PathBuf,
    /// Path to `mane_cds_data.tsv`, used for entries without Ensembl CDS.
    #[arg(long)]
    pub path_mane_cds_data: Option<PathBuf>,
    /// Path to `ensembl_gene_data.tsv`, used for entries without `ensembl_transcript_id`.
    #[arg(long)]
    pub path_ensembl_gene_data: Option<PathBuf>,
    /// Path to YAML file with genes known to be missing; defaults to the Ensembl 105 set.
    #[arg(long)]
    pub path_exclusions: Option<PathBuf>,
    /// Path to the output BED file, gzip compressed if ending in `.gz`.
    #[arg(long)]
    pub path_output: PathBuf,
}

/// Main entry point for `panel cds-bed` sub command.
pub fn run(common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!(
        "Writing panel CDS BED\ncommon args: {:#?}\nargs: {:#?}",
        common,
        args
    );
    require_inputs(
        [&args.path_panel, &args.path_ensembl_cds_data]
            .into_iter()
            .chain(args.path_mane_cds_data.as_ref())
            .chain(args.path_ensembl_gene_data.as_ref())
            .chain(args.path_exclusions.as_ref()),
    )?;
    let start = Instant::now();

    let exclusions = Exclusions::load(args.path_exclusions.as_deref())?;
    let panel = read_panel(&args.path_panel)?;
    let ensembl_cds = group_cds(read_cds_table(&args.path_ensembl_cds_data)?, |row| {
        Some(row.info.transcript_id.as_str())
    });
    let mane_cds = match &args.path_mane_cds_data {
        Some(path) => group_cds(read_cds_table(path)?, |row| row.info.hgnc_id.as_deref()),
        None => IndexMap::new(),
    };
    let ensembl_genes = args
        .path_ensembl_gene_data
        .as_ref()
        .map(read_gene_table)
        .transpose()?;

    let cds = PanelResolver::new(&exclusions).cds(
        &panel,
        &ensembl_cds,
        &mane_cds,
        ensembl_genes.as_ref(),
    )?;
    let count = OrderedEmitter::new(ContigSet::Nuclear).emit(
        &args.path_output,
        None,
        cds,
        emit::panel_cds_bed_row,
    )?;

    tracing::info!("Done writing {} panel CDS in {:?}", count, start.elapsed());
    Ok(())
}
