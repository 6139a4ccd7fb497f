//! APPRIS-filtered gene, transcript, and CDS tables of one annotation source.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use indexmap::IndexMap;
use thousands::Separable;

use crate::annotation::{
    AnnotationIndex, CanonicalRecord, FeatureRecord, FeatureType, GtfReader, Insertion, Source,
    TranscriptId,
};
use crate::common::contig::ContigSet;
use crate::emit::{self, OrderedEmitter};
use crate::error::{require_inputs, Error};
use crate::xref::{self, XrefTable};

/// Command line arguments for `compile annotations` sub command.
#[derive(Parser, Debug)]
#[command(about = "Compile APPRIS gene, transcript, and CDS tables", long_about = None)]
pub struct Args {
    /// Source of the annotation file.
    #[arg(long, value_enum)]
    pub source: Source,
    /// Path to the GTF annotation file, may be gzip compressed.
    #[arg(long)]
    pub path_annotation: PathBuf,
    /// Path to the APPRIS table with `Transcript ID` and `APPRIS Annotation` columns.
    #[arg(long)]
    pub path_appris: PathBuf,
    /// Path to the contig name/accession table, required for RefSeq.
    #[arg(long, required_if_eq("source", "refseq"))]
    pub path_contig_mapping: Option<PathBuf>,
    /// Directory to write `<source>.{genes.tsv,transcripts.bed,cds.bed}` to.
    #[arg(long)]
    pub output_dir: PathBuf,
}

/// Reconciled records of one annotation source.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub genes: Vec<CanonicalRecord>,
    pub transcripts: Vec<CanonicalRecord>,
    pub cds: Vec<CanonicalRecord>,
}

/// Counts of records discarded by the individual filters.
#[derive(Debug, Default, Clone, Copy)]
struct Discarded {
    non_appris: usize,
    no_gene_id: usize,
    unmapped_contig: usize,
    par_duplicates: usize,
}

/// Joins an annotation stream with the APPRIS and contig tables.
pub struct ReconciliationEngine<'a> {
    source: Source,
    appris: &'a XrefTable<String>,
    contig_names: Option<&'a XrefTable<String>>,
}

impl<'a> ReconciliationEngine<'a> {
    /// RefSeq annotation needs `contig_names` to map accessions to contig names.
    pub fn new(
        source: Source,
        appris: &'a XrefTable<String>,
        contig_names: Option<&'a XrefTable<String>>,
    ) -> Result<Self, anyhow::Error> {
        if source == Source::Refseq && contig_names.is_none() {
            anyhow::bail!("RefSeq annotation requires a contig mapping");
        }
        Ok(Self {
            source,
            appris,
            contig_names,
        })
    }

    /// Whether the transcript is APPRIS principal or alternative.
    ///
    /// Both the versioned and unversioned identifier are tried since APPRIS is versioned
    /// for RefSeq but not for Ensembl.
    pub fn is_appris(&self, transcript_id: &str) -> bool {
        match TranscriptId::try_new(transcript_id) {
            Ok(id) => {
                self.appris.contains_key(id.as_ref())
                    || id
                        .without_version()
                        .map(|id| self.appris.contains_key(id.as_ref()))
                        .unwrap_or(false)
            }
            Err(_) => false,
        }
    }

    /// Run the full reconciliation over a record stream.
    pub fn reconcile<I>(&self, records: I) -> Result<Reconciled, anyhow::Error>
    where
        I: IntoIterator<Item = Result<FeatureRecord, Error>>,
    {
        let mut discarded = Discarded::default();

        let mut retained = Vec::new();
        for result in records {
            let mut record = result?;
            if record.feature_type != FeatureType::Gene {
                let keep = record
                    .attributes
                    .get_str("transcript_id")
                    .is_some_and(|transcript_id| self.is_appris(transcript_id));
                if !keep {
                    discarded.non_appris += 1;
                    continue;
                }
            }
            self.source.extract(&mut record)?;
            if record.resolved.gene_id.is_none() {
                discarded.no_gene_id += 1;
                continue;
            }
            retained.push(record);
        }
        tracing::info!(
            "  retained {} records, {} non-APPRIS transcript records and {} records without \
            gene identifier discarded",
            retained.len().separate_with_commas(),
            discarded.non_appris.separate_with_commas(),
            discarded.no_gene_id.separate_with_commas()
        );

        if let Some(contig_names) = self.contig_names {
            let before = retained.len();
            retained = refseq_post_passes(retained, contig_names)?;
            discarded.unmapped_contig = before - retained.len();
            tracing::info!(
                "  {} records discarded on non-primary contigs",
                discarded.unmapped_contig.separate_with_commas()
            );
        }

        let mut index = AnnotationIndex::new();
        for record in &retained {
            let canonical = CanonicalRecord::try_from(record)?;
            let is_par_y_copy = record.is_par_y_copy();
            let insertion = match record.feature_type {
                FeatureType::Gene => index.insert_gene(canonical, is_par_y_copy)?,
                FeatureType::Transcript => index.insert_transcript(canonical, is_par_y_copy)?,
                FeatureType::Cds | FeatureType::StopCodon => {
                    index.insert_cds(canonical, is_par_y_copy)?
                }
            };
            if insertion == Insertion::SuppressedParDuplicate {
                discarded.par_duplicates += 1;
            }
        }
        tracing::info!(
            "  {} genes, {} transcripts, {} CDS records ({} pseudoautosomal duplicates suppressed)",
            index.gene_count().separate_with_commas(),
            index.transcript_count().separate_with_commas(),
            index.cds_count().separate_with_commas(),
            discarded.par_duplicates
        );

        let (genes, transcripts, cds) = index.into_parts();
        Ok(Reconciled {
            genes,
            transcripts,
            cds,
        })
    }
}

/// RefSeq passes over the retained records: HGNC back-fill and contig remapping.
///
/// HGNC identifiers are only present on gene records, so the gene to HGNC table is built
/// from all records first.  Records on accessions without a contig name, or whose name is
/// not a primary chromosome, are dropped.
fn refseq_post_passes(
    records: Vec<FeatureRecord>,
    contig_names: &XrefTable<String>,
) -> Result<Vec<FeatureRecord>, Error> {
    let mut hgnc_ids: IndexMap<String, String> = IndexMap::new();
    for record in &records {
        let (Some(gene_id), Some(hgnc_id)) = (&record.resolved.gene_id, &record.resolved.hgnc_id)
        else {
            continue;
        };
        match hgnc_ids.get(gene_id) {
            Some(first) if first != hgnc_id => {
                return Err(Error::InconsistentValue {
                    kind: "HGNC identifier of gene",
                    key: gene_id.clone(),
                    first: first.clone(),
                    second: hgnc_id.clone(),
                })
            }
            Some(_) => (),
            None => {
                hgnc_ids.insert(gene_id.clone(), hgnc_id.clone());
            }
        }
    }

    Ok(records
        .into_iter()
        .filter_map(|mut record| {
            let contig = contig_names.get(&record.seqname)?;
            record.resolved.contig = Some(contig.clone());
            if record.resolved.hgnc_id.is_none() {
                record.resolved.hgnc_id = record
                    .resolved
                    .gene_id
                    .as_ref()
                    .and_then(|gene_id| hgnc_ids.get(gene_id))
                    .cloned();
            }
            Some(record)
        })
        .filter(|record| ContigSet::WithMitochondrion.contains(record.contig()))
        .collect())
}

/// Main entry point for `compile annotations` sub command.
pub fn run(common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!(
        "Compiling {} annotation tables\ncommon args: {:#?}\nargs: {:#?}",
        args.source,
        common,
        args
    );
    require_inputs(
        [&args.path_annotation, &args.path_appris]
            .into_iter()
            .chain(args.path_contig_mapping.as_ref()),
    )?;
    let start = Instant::now();

    let appris = xref::load_appris(&args.path_appris)?;
    let contig_names = match (&args.source, &args.path_contig_mapping) {
        (Source::Refseq, Some(path)) => Some(xref::load_contig_mapping(path)?),
        _ => None,
    };
    let engine = ReconciliationEngine::new(args.source, &appris, contig_names.as_ref())?;

    tracing::info!("Reconciling annotation from {:?}", &args.path_annotation);
    let reader = GtfReader::from_path(&args.path_annotation, args.source.dialect())?;
    let reconciled = engine.reconcile(reader)?;

    write_reconciled(&reconciled, args.source, &args.output_dir)?;
    tracing::info!("Done compiling annotation tables in {:?}", start.elapsed());
    Ok(())
}

/// Write the gene, transcript, and CDS tables of `source` into `output_dir`.
///
/// All tables are ordered before the first one is written, so an unranked contig leaves no
/// output behind.
pub fn write_reconciled(
    reconciled: &Reconciled,
    source: Source,
    output_dir: &std::path::Path,
) -> Result<(), anyhow::Error> {
    let emitter = OrderedEmitter::new(ContigSet::WithMitochondrion);
    let genes = emitter.order(&reconciled.genes)?;
    let transcripts = emitter.order(&reconciled.transcripts)?;
    let cds = emitter.order(&reconciled.cds)?;

    let genes = emit::write_rows(
        output_dir.join(format!("{}.genes.tsv", source)),
        Some(emit::GENE_TSV_HEADER),
        genes.iter().map(|record| emit::gene_tsv_row(record)),
    )?;
    let transcripts = emit::write_rows(
        output_dir.join(format!("{}.transcripts.bed", source)),
        None,
        transcripts.iter().map(|record| emit::transcript_bed_row(record)),
    )?;
    let cds = emit::write_rows(
        output_dir.join(format!("{}.cds.bed", source)),
        None,
        cds.iter().map(|record| emit::cds_bed_row(record)),
    )?;
    tracing::info!(
        "  wrote {} genes, {} transcripts, {} CDS rows",
        genes.separate_with_commas(),
        transcripts.separate_with_commas(),
        cds.separate_with_commas()
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use temp_testdir::TempDir;

    use super::{run, write_reconciled, Args, ReconciliationEngine, Reconciled};
    use crate::annotation::{CanonicalRecord, Dialect, FeatureType, GtfReader, Source, Strand};
    use crate::common::Args as CommonArgs;
    use crate::error::Error;
    use crate::xref::XrefTable;

    fn appris(ids: &[&str]) -> XrefTable<String> {
        let mut table = XrefTable::new("APPRIS transcript");
        for id in ids {
            table.insert(id.to_string(), "PRINCIPAL:1".into()).unwrap();
        }
        table
    }

    #[rstest::rstest]
    #[case("ENST00000357654.9", true)]
    #[case("ENST00000357654", true)]
    #[case("NM_007294.4", true)]
    #[case("NM_007294.3", false)]
    #[case("ENST00000471181.7", false)]
    #[case("", false)]
    fn is_appris(#[case] transcript_id: &str, #[case] expected: bool) {
        let table = appris(&["ENST00000357654", "NM_007294.4"]);
        let engine = ReconciliationEngine::new(Source::Ensembl, &table, None).unwrap();

        assert_eq!(engine.is_appris(transcript_id), expected);
    }

    #[test]
    fn refseq_requires_contig_names() {
        let table = appris(&[]);

        assert!(ReconciliationEngine::new(Source::Refseq, &table, None).is_err());
    }

    #[test]
    fn refseq_backfills_hgnc_and_remaps_contigs() -> Result<(), anyhow::Error> {
        let text = "\
NC_000017.11\tBestRefSeq\tgene\t43044295\t43125364\t.\t-\t.\tgene_id \"BRCA1\"; transcript_id \"\"; db_xref \"GeneID:672\"; db_xref \"HGNC:HGNC:1100\"; gene \"BRCA1\";
NC_000017.11\tBestRefSeq\ttranscript\t43044295\t43125364\t.\t-\t.\tgene_id \"BRCA1\"; transcript_id \"NM_007294.4\"; db_xref \"GeneID:672\"; gene \"BRCA1\";
NC_000017.11\tBestRefSeq\tCDS\t43124017\t43124096\t.\t-\t0\tgene_id \"BRCA1\"; transcript_id \"NM_007294.4\"; db_xref \"GeneID:672\"; gene \"BRCA1\";
NT_187361.1\tBestRefSeq\tCDS\t100\t200\t.\t-\t0\tgene_id \"BRCA1\"; transcript_id \"NM_007294.4\"; db_xref \"GeneID:672\"; gene \"BRCA1\";
";
        let table = appris(&["NM_007294.4"]);
        let mut contigs = XrefTable::new("contig accession");
        contigs.insert("NC_000017.11".into(), "chr17".to_string())?;
        let engine = ReconciliationEngine::new(Source::Refseq, &table, Some(&contigs))?;

        let reconciled = engine.reconcile(GtfReader::new(text.as_bytes(), Dialect::NCBI))?;

        assert_eq!(reconciled.genes.len(), 1);
        assert_eq!(reconciled.cds.len(), 1);
        let cds = &reconciled.cds[0];
        assert_eq!(cds.contig, "chr17");
        assert_eq!(cds.hgnc_id.as_deref(), Some("HGNC:1100"));
        assert_eq!(cds.gene_id, "672");
        assert_eq!(
            reconciled.transcripts[0].transcript_id.as_deref(),
            Some("NM_007294.4")
        );

        Ok(())
    }

    #[test]
    fn refseq_conflicting_hgnc_is_fatal() -> Result<(), anyhow::Error> {
        let text = "\
NC_000017.11\tBestRefSeq\tgene\t1\t100\t.\t-\t.\tgene_id \"A\"; transcript_id \"\"; db_xref \"GeneID:1\"; db_xref \"HGNC:HGNC:1\"; gene \"A\";
NC_000017.11\tBestRefSeq\tgene\t1\t100\t.\t-\t.\tgene_id \"B\"; transcript_id \"\"; db_xref \"GeneID:1\"; db_xref \"HGNC:HGNC:2\"; gene \"B\";
";
        let table = appris(&[]);
        let contigs = XrefTable::new("contig accession");
        let engine = ReconciliationEngine::new(Source::Refseq, &table, Some(&contigs))?;

        let err = engine
            .reconcile(GtfReader::new(text.as_bytes(), Dialect::NCBI))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InconsistentValue { key, .. }) if key == "1"
        ));

        Ok(())
    }

    #[test]
    fn run_ensembl_smoke() -> Result<(), anyhow::Error> {
        let tmp_dir = TempDir::default();
        let args = Args {
            source: Source::Ensembl,
            path_annotation: "tests/data/annotation/ensembl.gtf".into(),
            path_appris: "tests/data/xref/appris.tsv".into(),
            path_contig_mapping: None,
            output_dir: tmp_dir.to_path_buf(),
        };

        run(&CommonArgs::default(), &args)?;

        let transcripts = std::fs::read_to_string(tmp_dir.join("ensembl.transcripts.bed"))?;
        insta::assert_snapshot!(transcripts.trim_end(), @"chr17	43044294	43125370	BRCA1;HGNC:1100;ENSG00000012048.23;ENST00000357654.9	-");
        let cds = std::fs::read_to_string(tmp_dir.join("ensembl.cds.bed"))?;
        insta::assert_snapshot!(cds.trim_end(), @r"
        chr17	43045677	43045802	BRCA1;HGNC:1100;ENSG00000012048.23;ENST00000357654.9;CDS	-
        chr17	43124016	43124096	BRCA1;HGNC:1100;ENSG00000012048.23;ENST00000357654.9;CDS	-
        ");
        let genes = std::fs::read_to_string(tmp_dir.join("ensembl.genes.tsv"))?;
        insta::assert_snapshot!(genes.trim_end(), @r"
        hgnc_id	gene_id	symbol	contig	start	end	strand
        HGNC:1100	ENSG00000012048.23	BRCA1	chr17	43044295	43125483	-
        NA	ENSG00000198888.2	MT-ND1	chrM	3307	4262	+
        ");

        Ok(())
    }

    #[test]
    fn run_refseq_missing_contig_mapping() {
        let args = Args {
            source: Source::Refseq,
            path_annotation: "tests/data/annotation/ensembl.gtf".into(),
            path_appris: "tests/data/xref/appris.tsv".into(),
            path_contig_mapping: Some("tests/data/xref/missing.tsv".into()),
            output_dir: TempDir::default().to_path_buf(),
        };

        let err = run(&CommonArgs::default(), &args).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InputNotFound(_))
        ));
    }

    #[test]
    fn unranked_contig_leaves_no_partial_output() {
        let tmp_dir = TempDir::default();
        let record = |contig: &str, feature_type| CanonicalRecord {
            contig: contig.to_string(),
            start: 43044295,
            end: 43125370,
            strand: Strand::Minus,
            symbol: "BRCA1".into(),
            hgnc_id: Some("HGNC:1100".into()),
            gene_id: "ENSG00000012048.23".into(),
            transcript_id: Some("ENST00000357654.9".into()),
            feature_type,
        };
        let reconciled = Reconciled {
            genes: vec![record("chr17", FeatureType::Gene)],
            transcripts: vec![record("chr17", FeatureType::Transcript)],
            cds: vec![record("chrUn_KI270742v1", FeatureType::Cds)],
        };

        let err = write_reconciled(&reconciled, Source::Ensembl, &tmp_dir).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnrankedContig(contig)) if contig == "chrUn_KI270742v1"
        ));
        assert!(!tmp_dir.join("ensembl.genes.tsv").exists());
        assert!(!tmp_dir.join("ensembl.transcripts.bed").exists());
    }
}
