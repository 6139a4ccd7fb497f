//! Deterministic ordering and row formatting of output tables.

use std::path::Path;

use crate::annotation::{CanonicalRecord, FeatureType};
use crate::common::contig::ContigSet;
use crate::common::io::std::open_write_maybe_gz;
use crate::common::NA;
use crate::error::Error;
use crate::tables::{CdsTableRow, GeneDataRow, TranscriptBedRow};

/// Header of the `<source>.genes.tsv` table.
pub const GENE_TSV_HEADER: &[&str] = &[
    "hgnc_id", "gene_id", "symbol", "contig", "start", "end", "strand",
];

/// Anything with a position that can be placed in chromosome order.
pub trait Locus {
    fn contig(&self) -> &str;
    /// Start coordinate; only compared between values of the same type.
    fn start(&self) -> u64;
}

impl<T: Locus + ?Sized> Locus for &T {
    fn contig(&self) -> &str {
        (**self).contig()
    }

    fn start(&self) -> u64 {
        (**self).start()
    }
}

impl Locus for CanonicalRecord {
    fn contig(&self) -> &str {
        &self.contig
    }

    fn start(&self) -> u64 {
        self.start
    }
}

/// Sorts rows by chromosome rank, then start, and writes them as tab-separated text.
#[derive(Debug, Clone, Copy)]
pub struct OrderedEmitter {
    contigs: ContigSet,
}

impl OrderedEmitter {
    pub fn new(contigs: ContigSet) -> Self {
        Self { contigs }
    }

    /// Stable sort by `(rank(contig), start)`.
    ///
    /// Fails with [`Error::UnrankedContig`] on the first contig outside of the contig set.
    pub fn order<T, I>(&self, items: I) -> Result<Vec<T>, Error>
    where
        T: Locus,
        I: IntoIterator<Item = T>,
    {
        let mut keyed = items
            .into_iter()
            .map(|item| Ok((self.contigs.rank(item.contig())?, item.start(), item)))
            .collect::<Result<Vec<_>, Error>>()?;
        keyed.sort_by_key(|(rank, start, _)| (*rank, *start));
        Ok(keyed.into_iter().map(|(_, _, item)| item).collect())
    }

    /// Order `items` and write one formatted row per item to `path`.
    ///
    /// Returns the number of rows written.
    pub fn emit<T, I, F, P>(
        &self,
        path: P,
        header: Option<&[&str]>,
        items: I,
        format: F,
    ) -> Result<usize, anyhow::Error>
    where
        T: Locus,
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> Vec<String>,
        P: AsRef<Path>,
    {
        let ordered = self.order(items)?;
        write_rows(path, header, ordered.iter().map(format))
    }
}

/// Write rows as tab-separated text without quoting, optionally preceded by a header.
pub fn write_rows<P, I>(path: P, header: Option<&[&str]>, rows: I) -> Result<usize, anyhow::Error>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Vec<String>>,
{
    tracing::debug!("Writing {:?}", path.as_ref());
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .has_headers(false)
        .from_writer(open_write_maybe_gz(path)?);
    if let Some(header) = header {
        writer.write_record(header)?;
    }
    let mut count = 0;
    for row in rows {
        writer.write_record(&row)?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// BED info column: `symbol;hgnc_id;gene_id;transcript_id[;feature]`.
///
/// An absent HGNC ID is written as an empty field.
pub fn bed_info(record: &CanonicalRecord, feature: Option<FeatureType>) -> String {
    let mut fields = vec![
        record.symbol.clone(),
        record.hgnc_id.clone().unwrap_or_default(),
        record.gene_id.clone(),
        record.transcript_id_or_na().to_string(),
    ];
    fields.extend(feature.map(|feature| feature.to_string()));
    fields.join(";")
}

/// Row of the `<source>.genes.tsv` table; coordinates stay 1-based.
pub fn gene_tsv_row(record: &CanonicalRecord) -> Vec<String> {
    vec![
        record.hgnc_id_or_na().to_string(),
        record.gene_id.clone(),
        record.symbol.clone(),
        record.contig.clone(),
        record.start.to_string(),
        record.end.to_string(),
        record.strand.to_string(),
    ]
}

/// Row of the `<source>.transcripts.bed` table.
pub fn transcript_bed_row(record: &CanonicalRecord) -> Vec<String> {
    vec![
        record.contig.clone(),
        (record.start - 1).to_string(),
        record.end.to_string(),
        bed_info(record, None),
        record.strand.to_string(),
    ]
}

/// Row of the `<source>.cds.bed` table; the info column ends with the feature type.
pub fn cds_bed_row(record: &CanonicalRecord) -> Vec<String> {
    vec![
        record.contig.clone(),
        (record.start - 1).to_string(),
        record.end.to_string(),
        bed_info(record, Some(record.feature_type)),
        record.strand.to_string(),
    ]
}

/// Row of the Ensembl or RefSeq gene data table.
///
/// `transcript_id` is the canonical (Ensembl) or MANE Select (RefSeq) transcript of the gene.
pub fn gene_data_row(record: &CanonicalRecord, transcript_id: Option<&str>) -> Vec<String> {
    vec![
        record.hgnc_id_or_na().to_string(),
        record.gene_id.clone(),
        record.symbol.clone(),
        transcript_id.unwrap_or(NA).to_string(),
        record.contig.clone(),
        record.start.to_string(),
        record.end.to_string(),
        record.strand.to_string(),
    ]
}

/// Row of a canonical CDS table: 1-based, `symbol;hgnc_id;gene_id;transcript_id` info.
pub fn cds_table_row(record: &CanonicalRecord) -> Vec<String> {
    let info = [
        record.symbol.as_str(),
        record.hgnc_id_or_na(),
        record.gene_id.as_str(),
        record.transcript_id_or_na(),
    ]
    .join(";");
    vec![
        record.contig.clone(),
        record.start.to_string(),
        record.end.to_string(),
        info,
        record.strand.to_string(),
    ]
}

/// Row of the panel gene BED: `contig, start - 1, end, symbol`.
pub fn panel_gene_bed_row(gene: &GeneDataRow) -> Vec<String> {
    vec![
        gene.contig.clone(),
        (gene.start - 1).to_string(),
        gene.end.to_string(),
        gene.symbol.clone(),
    ]
}

/// Row of the panel CDS BED, with a `.` score column.
pub fn panel_cds_bed_row(cds: &CdsTableRow) -> Vec<String> {
    vec![
        cds.contig.clone(),
        (cds.start - 1).to_string(),
        cds.end.to_string(),
        cds.info.to_string(),
        ".".to_string(),
        cds.strand.to_string(),
    ]
}

/// Row of the panel transcript BED, copied from the transcript table.
pub fn panel_transcript_bed_row(transcript: &TranscriptBedRow) -> Vec<String> {
    vec![
        transcript.contig.clone(),
        transcript.start0.to_string(),
        transcript.end.to_string(),
        transcript.info_raw.clone(),
        transcript.strand.to_string(),
    ]
}
