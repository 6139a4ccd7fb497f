//! Driver gene panel with resolved oncogene/tumour suppressor roles.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use crate::emit;
use crate::error::require_inputs;
use crate::panel::roles::{driver_gene_row, resolve_role};
use crate::panel::{read_panel, PanelEntry};
use crate::xref::{self, XrefTable};

/// Command line arguments for `panel driver-genes` sub command.
#[derive(Parser, Debug)]
#[command(about = "Write driver gene panel in Hartwig format", long_about = None)]
pub struct Args {
    /// Path to the panel gene list.
    #[arg(long)]
    pub path_panel: PathBuf,
    /// Path to the Hartwig driver gene panel with `gene` and `likelihoodType` columns.
    #[arg(long)]
    pub path_hartwig_panel: PathBuf,
    /// Path to the output TSV file, gzip compressed if ending in `.gz`.
    #[arg(long)]
    pub path_output: PathBuf,
}

/// Panel entries keyed by symbol; entries without symbol are skipped.
fn panel_by_symbol(panel: Vec<PanelEntry>) -> Result<XrefTable<PanelEntry>, anyhow::Error> {
    let mut table = XrefTable::new("panel gene symbol");
    for entry in panel {
        if let Some(symbol) = entry.symbol.clone() {
            table.insert(symbol, entry)?;
        }
    }
    Ok(table)
}

/// Main entry point for `panel driver-genes` sub command.
pub fn run(common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!(
        "Writing driver gene panel\ncommon args: {:#?}\nargs: {:#?}",
        common,
        args
    );
    require_inputs([&args.path_panel, &args.path_hartwig_panel])?;
    let start = Instant::now();

    let reference = xref::load_gene_roles(&args.path_hartwig_panel)?;
    let panel = panel_by_symbol(read_panel(&args.path_panel)?)?;

    let rows = panel
        .iter()
        .map(|(symbol, entry)| {
            let role = resolve_role(
                symbol,
                entry.oncogene.as_deref(),
                entry.tsgene.as_deref(),
                reference.roles.get(symbol).map(String::as_str),
            )?;
            Ok(driver_gene_row(symbol, role))
        })
        .collect::<Result<Vec<_>, crate::error::Error>>()?;

    let header: Vec<&str> = reference.header.iter().map(String::as_str).collect();
    let count = emit::write_rows(&args.path_output, Some(header.as_slice()), rows)?;

    tracing::info!("Done writing {} driver genes in {:?}", count, start.elapsed());
    Ok(())
}
