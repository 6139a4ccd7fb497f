//! RefSeq genes joined to their MANE Select transcripts.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;

use crate::annotation::{
    AnnotationIndex, CanonicalRecord, FeatureRecord, FeatureType, GtfReader, Insertion, Source,
};
use crate::emit;
use crate::error::{require_inputs, Error};
use crate::tables::GeneTableKind;
use crate::xref::{self, XrefTable};

/// Command line arguments for `compile refseq-mane` sub command.
#[derive(Parser, Debug)]
#[command(about = "Compile RefSeq gene and MANE Select CDS tables", long_about = None)]
pub struct Args {
    /// Path to the RefSeq GTF annotation file, may be gzip compressed.
    #[arg(long)]
    pub path_annotation: PathBuf,
    /// Path to the contig name/accession table.
    #[arg(long)]
    pub path_contig_mapping: PathBuf,
    /// Path to the NCBI gene ID/MANE Select transcript table.
    #[arg(long)]
    pub path_mane_select: PathBuf,
    /// Directory to write `refseq_gene_data.tsv` and `mane_cds_data.tsv` to.
    #[arg(long)]
    pub output_dir: PathBuf,
}

/// Index RefSeq genes and CDS on the contigs of `contig_names`.
///
/// Records on other accessions or without `GeneID` cross-reference are skipped.  The chrY copies of pseudoautosomal genes are
/// suppressed.
pub fn index_refseq<I>(records: I, contig_names: &XrefTable<String>) -> Result<AnnotationIndex, Error>
where
    I: IntoIterator<Item = Result<FeatureRecord, Error>>,
{
    let mut index = AnnotationIndex::new();
    let mut par_duplicates = 0;
    for result in records {
        let mut record = result?;
        if !matches!(record.feature_type, FeatureType::Gene | FeatureType::Cds) {
            continue;
        }
        let Some(contig) = contig_names.get(&record.seqname) else {
            continue;
        };
        record.resolved.contig = Some(contig.clone());
        Source::Refseq.extract(&mut record)?;
        if record.resolved.gene_id.is_none() {
            tracing::debug!("skipping record without GeneID on {}", record.contig());
            continue;
        }

        let canonical = CanonicalRecord::try_from(&record)?;
        let insertion = if record.feature_type == FeatureType::Gene {
            index.insert_gene(canonical, record.is_par_y_copy())?
        } else {
            if canonical.transcript_id.is_none() {
                return Err(record.missing_attr("transcript_id"));
            }
            index.insert_cds(canonical, record.is_par_y_copy())?
        };
        if insertion == Insertion::SuppressedParDuplicate {
            par_duplicates += 1;
        }
    }
    tracing::info!(
        "  {} genes, {} CDS records ({} pseudoautosomal duplicates suppressed)",
        index.gene_count(),
        index.cds_count(),
        par_duplicates
    );
    Ok(index)
}

/// CDS records of each gene's MANE Select transcript, HGNC identifier taken from the gene.
///
/// Genes without MANE transcript and MANE transcripts without CDS are skipped.
pub fn mane_cds(
    index: &AnnotationIndex,
    mane: &XrefTable<String>,
) -> Result<Vec<CanonicalRecord>, Error> {
    let mut result = Vec::new();
    for gene in index.genes() {
        let Some(transcript_id) = mane.get(&gene.gene_id) else {
            tracing::debug!("no MANE Select transcript for {} ({})", &gene.gene_id, &gene.symbol);
            continue;
        };
        let Some(group) = index.cds(transcript_id) else {
            tracing::debug!("no CDS for MANE Select transcript {}", transcript_id);
            continue;
        };
        for record in group {
            if record.gene_id != gene.gene_id {
                return Err(Error::InconsistentValue {
                    kind: "gene identifier of MANE Select CDS",
                    key: transcript_id.clone(),
                    first: gene.gene_id.clone(),
                    second: record.gene_id.clone(),
                });
            }
            result.push(CanonicalRecord {
                hgnc_id: gene.hgnc_id.clone(),
                ..record.clone()
            });
        }
    }
    Ok(result)
}

/// Write `refseq_gene_data.tsv` and `mane_cds_data.tsv` in annotation order.
pub fn write_mane_data(
    index: &AnnotationIndex,
    mane: &XrefTable<String>,
    output_dir: &Path,
) -> Result<(), anyhow::Error> {
    let kind = GeneTableKind::Refseq;
    let genes = emit::write_rows(
        output_dir.join(kind.file_name()),
        Some(kind.header()),
        index
            .genes()
            .map(|gene| emit::gene_data_row(gene, mane.get(&gene.gene_id).map(String::as_str))),
    )?;
    let cds = emit::write_rows(
        output_dir.join(kind.cds_file_name()),
        None,
        mane_cds(index, mane)?.iter().map(emit::cds_table_row),
    )?;
    tracing::info!("  wrote {} genes and {} MANE Select CDS rows", genes, cds);
    Ok(())
}

/// Main entry point for `compile refseq-mane` sub command.
pub fn run(common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!(
        "Compiling RefSeq MANE Select tables\ncommon args: {:#?}\nargs: {:#?}",
        common,
        args
    );
    require_inputs([
        &args.path_annotation,
        &args.path_contig_mapping,
        &args.path_mane_select,
    ])?;
    let start = Instant::now();

    let contig_names = xref::load_contig_mapping(&args.path_contig_mapping)?;
    let mane = xref::load_mane_select(&args.path_mane_select)?;
    let reader = GtfReader::from_path(&args.path_annotation, Source::Refseq.dialect())?;
    let index = index_refseq(reader, &contig_names)?;

    write_mane_data(&index, &mane, &args.output_dir)?;
    tracing::info!("Done compiling RefSeq MANE Select tables in {:?}", start.elapsed());
    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use temp_testdir::TempDir;

    use super::{index_refseq, mane_cds, run, Args};
    use crate::annotation::{Dialect, GtfReader};
    use crate::common::Args as CommonArgs;
    use crate::error::Error;
    use crate::xref::XrefTable;

    fn contigs() -> XrefTable<String> {
        let mut table = XrefTable::new("contig accession");
        for (accession, name) in [("NC_000023.11", "chrX"), ("NC_000024.10", "chrY")] {
            table.insert(accession.into(), name.to_string()).unwrap();
        }
        table
    }

    const SHOX: &str = "\
NC_000023.11\tBestRefSeq\tgene\t624344\t659411\t.\t+\t.\tgene_id \"SHOX\"; transcript_id \"\"; db_xref \"GeneID:6473\"; db_xref \"HGNC:HGNC:10853\"; gene \"SHOX\";
NC_000023.11\tBestRefSeq\tCDS\t630645\t630897\t.\t+\t0\tgene_id \"SHOX\"; transcript_id \"NM_000451.4\"; db_xref \"GeneID:6473\"; gene \"SHOX\";
NC_000024.10\tBestRefSeq\tgene\t624344\t659411\t.\t+\t.\tgene_id \"SHOX_1\"; transcript_id \"\"; db_xref \"GeneID:6473\"; db_xref \"HGNC:HGNC:10853\"; gene \"SHOX\";
NC_000024.10\tBestRefSeq\tCDS\t630645\t630897\t.\t+\t0\tgene_id \"SHOX_1\"; transcript_id \"NM_000451.4\"; db_xref \"GeneID:6473\"; gene \"SHOX\";
NT_187633.1\tBestRefSeq\tgene\t1\t100\t.\t+\t.\tgene_id \"SHOX\"; transcript_id \"\"; db_xref \"GeneID:6473\"; gene \"SHOX\";
";

    #[test]
    fn par_copies_are_suppressed() -> Result<(), anyhow::Error> {
        let index = index_refseq(GtfReader::new(SHOX.as_bytes(), Dialect::NCBI), &contigs())?;

        assert_eq!(index.gene_count(), 1);
        assert_eq!(index.gene("6473").unwrap().contig, "chrX");
        assert_eq!(index.cds_count(), 1);

        Ok(())
    }

    #[test]
    fn duplicate_gene_outside_par_is_fatal() {
        let text = SHOX.replace("gene_id \"SHOX_1\"", "gene_id \"SHOX\"");

        let result = index_refseq(GtfReader::new(text.as_bytes(), Dialect::NCBI), &contigs());

        assert!(matches!(result, Err(Error::DuplicateKey { .. })));
    }

    #[test]
    fn mane_cds_takes_hgnc_from_gene() -> Result<(), anyhow::Error> {
        let index = index_refseq(GtfReader::new(SHOX.as_bytes(), Dialect::NCBI), &contigs())?;
        let mut mane = XrefTable::new("MANE Select gene");
        mane.insert("6473".into(), "NM_000451.4".to_string())?;

        let cds = mane_cds(&index, &mane)?;

        assert_eq!(cds.len(), 1);
        assert_eq!(cds[0].hgnc_id.as_deref(), Some("HGNC:10853"));
        assert_eq!(cds[0].transcript_id.as_deref(), Some("NM_000451.4"));

        Ok(())
    }

    #[test]
    fn run_smoke() -> Result<(), anyhow::Error> {
        let tmp_dir = TempDir::default();
        let args = Args {
            path_annotation: "tests/data/annotation/refseq.gtf".into(),
            path_contig_mapping: "tests/data/xref/contigs.tsv".into(),
            path_mane_select: "tests/data/xref/mane.tsv".into(),
            output_dir: tmp_dir.to_path_buf(),
        };

        run(&CommonArgs::default(), &args)?;

        let genes = std::fs::read_to_string(tmp_dir.join("refseq_gene_data.tsv"))?;
        insta::assert_snapshot!(genes.trim_end(), @r"
        hgnc_id	ncbi_gene_id	symbol	mane_transcript_id	contig	start	end	strand
        HGNC:1100	672	BRCA1	NM_007294.4	chr17	43044295	43125483	-
        HGNC:12155	6957	TRB	NA	chr7	142299011	142813287	+
        ");
        let cds = std::fs::read_to_string(tmp_dir.join("mane_cds_data.tsv"))?;
        insta::assert_snapshot!(cds.trim_end(), @r"
        chr17	43124017	43124096	BRCA1;HGNC:1100;672;NM_007294.4	-
        chr17	43045678	43045802	BRCA1;HGNC:1100;672;NM_007294.4	-
        ");

        Ok(())
    }
}
