//! Intermediate canonical tables shared by the `compile` and `panel` sub commands.

use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::annotation::Strand;
use crate::common::io::std::open_tsv_reader;
use crate::common::{non_na, NA};
use crate::emit::Locus;
use crate::error::Error;
use crate::xref::XrefTable;

/// The two flavours of gene data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum GeneTableKind {
    /// `ensembl_gene_data.tsv`, genes with their Ensembl canonical transcript.
    Ensembl,
    /// `refseq_gene_data.tsv`, genes with their MANE Select transcript.
    Refseq,
}

impl GeneTableKind {
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            GeneTableKind::Ensembl => &[
                "hgnc_id",
                "ensembl_gene_id",
                "symbol",
                "ensembl_transcript_id",
                "contig",
                "start",
                "end",
                "strand",
            ],
            GeneTableKind::Refseq => &[
                "hgnc_id",
                "ncbi_gene_id",
                "symbol",
                "mane_transcript_id",
                "contig",
                "start",
                "end",
                "strand",
            ],
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            GeneTableKind::Ensembl => "ensembl_gene_data.tsv",
            GeneTableKind::Refseq => "refseq_gene_data.tsv",
        }
    }

    /// Name of the matching canonical CDS table.
    pub fn cds_file_name(&self) -> &'static str {
        match self {
            GeneTableKind::Ensembl => "ensembl_cds_data.tsv",
            GeneTableKind::Refseq => "mane_cds_data.tsv",
        }
    }
}

/// One row of a gene data table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Deserialize)]
pub struct GeneDataRow {
    pub hgnc_id: String,
    #[serde(alias = "ensembl_gene_id", alias = "ncbi_gene_id")]
    pub gene_id: String,
    pub symbol: String,
    #[serde(alias = "ensembl_transcript_id", alias = "mane_transcript_id")]
    pub transcript_id: String,
    pub contig: String,
    /// 1-based start position.
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
}

impl Locus for GeneDataRow {
    fn contig(&self) -> &str {
        &self.contig
    }

    fn start(&self) -> u64 {
        self.start
    }
}

/// Reject intervals that are not 1-based with `start <= end`.
fn check_interval(line_no: usize, start: u64, end: u64) -> Result<(), Error> {
    if start == 0 || start > end {
        return Err(Error::MalformedRecord {
            line_no,
            reason: format!("invalid interval {}-{}", start, end),
        });
    }
    Ok(())
}

/// Read a gene data table keyed by gene identifier.
pub fn read_gene_table<P: AsRef<Path>>(path: P) -> Result<XrefTable<GeneDataRow>, anyhow::Error> {
    tracing::info!("Reading gene data from {:?}", path.as_ref());
    let mut table = XrefTable::new("gene data identifier");
    for (i, result) in open_tsv_reader(path, true)?.deserialize().enumerate() {
        let row: GeneDataRow = result?;
        check_interval(i + 2, row.start, row.end)?;
        table.insert(row.gene_id.clone(), row)?;
    }
    tracing::info!("... done reading {} genes", table.len());
    Ok(table)
}

/// The `symbol;hgnc_id;gene_id;transcript_id` column of CDS and transcript tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowInfo {
    pub symbol: String,
    pub hgnc_id: Option<String>,
    pub gene_id: String,
    pub transcript_id: String,
}

impl FromStr for RowInfo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(';').collect();
        match fields.as_slice() {
            [symbol, hgnc_id, gene_id, transcript_id, ..] => Ok(Self {
                symbol: symbol.to_string(),
                hgnc_id: non_na(hgnc_id).map(str::to_string),
                gene_id: gene_id.to_string(),
                transcript_id: transcript_id.to_string(),
            }),
            _ => Err(format!("expected at least 4 ';'-separated fields in {:?}", s)),
        }
    }
}

impl Display for RowInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{};{};{};{}",
            &self.symbol,
            self.hgnc_id.as_deref().unwrap_or(NA),
            &self.gene_id,
            &self.transcript_id
        )
    }
}

/// One row of a canonical CDS table, 1-based coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CdsTableRow {
    pub contig: String,
    pub start: u64,
    pub end: u64,
    pub info: RowInfo,
    pub strand: Strand,
}

impl Locus for CdsTableRow {
    fn contig(&self) -> &str {
        &self.contig
    }

    fn start(&self) -> u64 {
        self.start
    }
}

/// Read a headerless canonical CDS table.
pub fn read_cds_table<P: AsRef<Path>>(path: P) -> Result<Vec<CdsTableRow>, anyhow::Error> {
    tracing::info!("Reading CDS data from {:?}", path.as_ref());
    let mut rows = Vec::new();
    for (i, result) in open_tsv_reader(path, false)?.deserialize().enumerate() {
        let (contig, start, end, info, strand): (String, u64, u64, String, Strand) = result?;
        check_interval(i + 1, start, end)?;
        let info = info
            .parse()
            .map_err(|reason| Error::MalformedRecord { line_no: i + 1, reason })?;
        rows.push(CdsTableRow {
            contig,
            start,
            end,
            info,
            strand,
        });
    }
    tracing::info!("... done reading {} CDS records", rows.len());
    Ok(rows)
}

/// Group CDS rows by `key`, keeping file order; rows without a key are dropped.
pub fn group_cds<F>(rows: Vec<CdsTableRow>, key: F) -> IndexMap<String, Vec<CdsTableRow>>
where
    F: Fn(&CdsTableRow) -> Option<&str>,
{
    let mut groups: IndexMap<String, Vec<CdsTableRow>> = IndexMap::new();
    for row in rows {
        if let Some(key) = key(&row).map(str::to_string) {
            groups.entry(key).or_default().push(row);
        }
    }
    groups
}

/// One row of a `<source>.transcripts.bed` table, kept verbatim for re-emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptBedRow {
    pub contig: String,
    /// 0-based start position.
    pub start0: u64,
    pub end: u64,
    pub info_raw: String,
    pub info: RowInfo,
    pub strand: Strand,
}

impl Locus for TranscriptBedRow {
    fn contig(&self) -> &str {
        &self.contig
    }

    fn start(&self) -> u64 {
        self.start0
    }
}

/// Read a transcript BED table.
pub fn read_transcript_bed<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<TranscriptBedRow>, anyhow::Error> {
    tracing::info!("Reading transcripts from {:?}", path.as_ref());
    let mut rows = Vec::new();
    for (i, result) in open_tsv_reader(path, false)?.deserialize().enumerate() {
        let (contig, start0, end, info_raw, strand): (String, u64, u64, String, Strand) = result?;
        let info = info_raw
            .parse()
            .map_err(|reason| Error::MalformedRecord { line_no: i + 1, reason })?;
        rows.push(TranscriptBedRow {
            contig,
            start0,
            end,
            info_raw,
            info,
            strand,
        });
    }
    tracing::info!("... done reading {} transcripts", rows.len());
    Ok(rows)
}
