//! Source-specific extraction of gene, transcript, and HGNC identifiers.

use crate::annotation::attrs::Dialect;
use crate::annotation::record::FeatureRecord;
use crate::common::non_na;
use crate::error::Error;

/// The annotation source a file comes from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum::Display, serde::Serialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum Source {
    /// Ensembl/GENCODE GTF.
    Ensembl,
    /// NCBI RefSeq GTF.
    Refseq,
}

impl Source {
    /// Attribute dialect used by the source's GTF files.
    pub fn dialect(&self) -> Dialect {
        match self {
            Source::Ensembl => Dialect::ESCAPED,
            Source::Refseq => Dialect::NCBI,
        }
    }

    /// Fill the resolved fields of `record`.
    pub fn extract(&self, record: &mut FeatureRecord) -> Result<(), Error> {
        match self {
            Source::Ensembl => extract_ensembl(record),
            Source::Refseq => extract_refseq(record),
        }
    }
}

/// Ensembl records carry their identifiers directly.
///
/// Genes without a `gene_name` fall back to their gene identifier as symbol.
pub fn extract_ensembl(record: &mut FeatureRecord) -> Result<(), Error> {
    let gene_id = record.require_attr("gene_id")?.to_string();
    let symbol = record
        .attributes
        .get_str("gene_name")
        .unwrap_or(&gene_id)
        .to_string();
    let hgnc_id = record
        .attributes
        .get_str("hgnc_id")
        .and_then(non_na)
        .map(str::to_string);
    let transcript_id = record
        .attributes
        .get_str("transcript_id")
        .and_then(non_na)
        .map(str::to_string);

    record.resolved.gene_id = Some(gene_id);
    record.resolved.symbol = Some(symbol);
    record.resolved.hgnc_id = hgnc_id;
    record.resolved.transcript_id = transcript_id;
    Ok(())
}

/// RefSeq records carry NCBI gene and HGNC identifiers in `db_xref` values.
///
/// HGNC IDs are only present on gene records; they are back-filled later.  Records without
/// a `GeneID` cross-reference are left without gene identifier and skipped by the callers.
pub fn extract_refseq(record: &mut FeatureRecord) -> Result<(), Error> {
    let gene_id = dbxref(record, "GeneID")?;
    let hgnc_id = dbxref(record, "HGNC")?;
    let symbol = match record.attributes.get_str("gene") {
        Some(symbol) => symbol.to_string(),
        None => record.require_attr("gene_id")?.to_string(),
    };
    let transcript_id = record
        .attributes
        .get_str("transcript_id")
        .and_then(non_na)
        .map(str::to_string);

    record.resolved.gene_id = gene_id;
    record.resolved.symbol = Some(symbol);
    if hgnc_id.is_some() {
        record.resolved.hgnc_id = hgnc_id;
    }
    record.resolved.transcript_id = transcript_id;
    Ok(())
}

/// The value of the single `db_xref` entry with the given prefix.
///
/// `db_xref "HGNC:HGNC:7"` yields `HGNC:7` for prefix `HGNC`.  More than one entry with
/// the same prefix is an error.
pub fn dbxref(record: &FeatureRecord, prefix: &str) -> Result<Option<String>, Error> {
    let needle = format!("{}:", prefix);
    let mut matches = record
        .attributes
        .texts("db_xref")
        .filter_map(|value| value.strip_prefix(needle.as_str()));
    let first = matches.next();
    if let Some(second) = matches.next() {
        return Err(Error::DuplicateKey {
            kind: "db_xref prefix",
            key: format!("{} ({} / {})", prefix, first.unwrap_or_default(), second),
        });
    }
    Ok(first.map(str::to_string))
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{dbxref, extract_ensembl, extract_refseq};
    use crate::annotation::attrs::Dialect;
    use crate::annotation::record::FeatureRecord;
    use crate::error::Error;

    fn record(attributes: &str) -> FeatureRecord {
        let line = format!("NC_000017.11\tBestRefSeq\tgene\t1\t100\t.\t+\t.\t{}", attributes);
        FeatureRecord::parse_line(&line, 1, Dialect::NCBI)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn refseq_dbxref_extraction() -> Result<(), anyhow::Error> {
        let mut record = record(
            r#"gene_id "A1BG"; transcript_id ""; db_xref "HGNC:HGNC:7"; db_xref "GeneID:99"; gene "A1BG";"#,
        );
        extract_refseq(&mut record)?;

        assert_eq!(record.resolved.hgnc_id.as_deref(), Some("HGNC:7"));
        assert_eq!(record.resolved.gene_id.as_deref(), Some("99"));
        assert_eq!(record.resolved.symbol.as_deref(), Some("A1BG"));
        assert_eq!(record.resolved.transcript_id, None);

        Ok(())
    }

    #[test]
    fn refseq_duplicate_prefix() {
        let record = record(r#"gene_id "X"; db_xref "GeneID:1"; db_xref "GeneID:2";"#);

        assert!(matches!(
            dbxref(&record, "GeneID"),
            Err(Error::DuplicateKey { .. })
        ));
    }

    #[test]
    fn refseq_missing_gene_id() -> Result<(), anyhow::Error> {
        let mut record = record(r#"gene_id "X"; db_xref "HGNC:HGNC:7";"#);
        extract_refseq(&mut record)?;

        assert_eq!(record.resolved.gene_id, None);
        assert_eq!(record.resolved.hgnc_id.as_deref(), Some("HGNC:7"));

        Ok(())
    }

    #[test]
    fn ensembl_defaults() -> Result<(), anyhow::Error> {
        let mut record = record(r#"gene_id "ENSG00000284662.1"; gene_type "protein_coding";"#);
        extract_ensembl(&mut record)?;

        assert_eq!(record.resolved.gene_id.as_deref(), Some("ENSG00000284662.1"));
        assert_eq!(record.resolved.symbol.as_deref(), Some("ENSG00000284662.1"));
        assert_eq!(record.resolved.hgnc_id, None);
        assert_eq!(record.resolved.transcript_id, None);

        Ok(())
    }
}
