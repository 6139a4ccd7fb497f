//! Ensembl genes with HGNC identifiers and the CDS of their canonical transcripts.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use indexmap::IndexMap;

use crate::annotation::{
    AnnotationIndex, CanonicalRecord, Dialect, FeatureRecord, FeatureType, GtfReader, Source,
};
use crate::emit;
use crate::error::{require_inputs, Error};
use crate::tables::GeneTableKind;

/// Tag value marking the canonical transcript of a gene.
const CANONICAL_TAG: &str = "Ensembl_canonical";

/// Command line arguments for `compile ensembl-canonical` sub command.
#[derive(Parser, Debug)]
#[command(about = "Compile Ensembl gene and canonical CDS tables", long_about = None)]
pub struct Args {
    /// Path to the Ensembl GTF annotation file, may be gzip compressed.
    #[arg(long)]
    pub path_annotation: PathBuf,
    /// Directory to write `ensembl_gene_data.tsv` and `ensembl_cds_data.tsv` to.
    #[arg(long)]
    pub output_dir: PathBuf,
}

/// Genes and canonical transcript CDS of an Ensembl annotation.
#[derive(Debug, Default)]
pub struct CanonicalData {
    pub index: AnnotationIndex,
    /// Canonical transcript by gene identifier.
    pub canonical_transcripts: IndexMap<String, String>,
}

impl CanonicalData {
    /// Add one record; records without an HGNC identifier are ignored.
    pub fn push(&mut self, mut record: FeatureRecord) -> Result<(), Error> {
        if record.attributes.get_str("hgnc_id").is_none() {
            return Ok(());
        }
        match record.feature_type {
            FeatureType::Gene => {
                Source::Ensembl.extract(&mut record)?;
                self.index
                    .insert_gene(CanonicalRecord::try_from(&record)?, false)?;
            }
            FeatureType::Cds if record.attributes.has_value("tag", CANONICAL_TAG) => {
                Source::Ensembl.extract(&mut record)?;
                let canonical = CanonicalRecord::try_from(&record)?;
                let transcript_id = canonical
                    .transcript_id
                    .clone()
                    .ok_or_else(|| record.missing_attr("transcript_id"))?;
                match self.canonical_transcripts.get(&canonical.gene_id) {
                    Some(first) if first != &transcript_id => {
                        return Err(Error::InconsistentValue {
                            kind: "canonical transcript of gene",
                            key: canonical.gene_id,
                            first: first.clone(),
                            second: transcript_id,
                        })
                    }
                    Some(_) => (),
                    None => {
                        self.canonical_transcripts
                            .insert(canonical.gene_id.clone(), transcript_id);
                    }
                }
                self.index.insert_cds(canonical, false)?;
            }
            _ => (),
        }
        Ok(())
    }

    /// Collect all records of a stream.
    pub fn collect<I>(records: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = Result<FeatureRecord, Error>>,
    {
        let mut data = Self::default();
        for record in records {
            data.push(record?)?;
        }
        Ok(data)
    }
}

/// Write `ensembl_gene_data.tsv` and `ensembl_cds_data.tsv` in annotation order.
pub fn write_canonical_data(data: &CanonicalData, output_dir: &Path) -> Result<(), anyhow::Error> {
    let kind = GeneTableKind::Ensembl;
    let genes = emit::write_rows(
        output_dir.join(kind.file_name()),
        Some(kind.header()),
        data.index.genes().map(|gene| {
            emit::gene_data_row(
                gene,
                data.canonical_transcripts
                    .get(&gene.gene_id)
                    .map(String::as_str),
            )
        }),
    )?;
    let cds = emit::write_rows(
        output_dir.join(kind.cds_file_name()),
        None,
        data.index
            .cds_groups()
            .flat_map(|(_, group)| group.iter().map(emit::cds_table_row)),
    )?;
    tracing::info!("  wrote {} genes and {} canonical CDS rows", genes, cds);
    Ok(())
}

/// Main entry point for `compile ensembl-canonical` sub command.
pub fn run(common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!(
        "Compiling Ensembl canonical tables\ncommon args: {:#?}\nargs: {:#?}",
        common,
        args
    );
    require_inputs([&args.path_annotation])?;
    let start = Instant::now();

    let reader = GtfReader::from_path(&args.path_annotation, Dialect::GROUPED)?;
    let data = CanonicalData::collect(reader)?;
    tracing::info!(
        "  {} genes with HGNC identifier, {} canonical transcripts",
        data.index.gene_count(),
        data.canonical_transcripts.len()
    );

    write_canonical_data(&data, &args.output_dir)?;
    tracing::info!("Done compiling Ensembl canonical tables in {:?}", start.elapsed());
    Ok(())
}
