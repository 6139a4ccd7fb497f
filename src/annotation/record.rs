//! GTF feature records and the canonical records derived from them.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::annotation::attrs::{Attributes, Dialect};
use crate::common::NA;
use crate::error::Error;

/// Feature types that are materialized from the annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureType {
    Gene,
    Transcript,
    Cds,
    StopCodon,
}

impl FeatureType {
    /// Interpret the GTF `feature` column; other feature types yield `None`.
    pub fn from_column(s: &str) -> Option<Self> {
        match s {
            "gene" => Some(FeatureType::Gene),
            "transcript" => Some(FeatureType::Transcript),
            "CDS" => Some(FeatureType::Cds),
            "stop_codon" => Some(FeatureType::StopCodon),
            _ => None,
        }
    }
}

impl Display for FeatureType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureType::Gene => write!(f, "gene"),
            FeatureType::Transcript => write!(f, "transcript"),
            FeatureType::Cds => write!(f, "CDS"),
            FeatureType::StopCodon => write!(f, "stop_codon"),
        }
    }
}

/// Enumeration for the two strands of the genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl FromStr for Strand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Plus),
            "-" => Ok(Strand::Minus),
            _ => anyhow::bail!("invalid strand {:?}", s),
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

/// Fields resolved by source-specific extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    /// Gene identifier (Ensembl gene ID or NCBI gene ID).
    pub gene_id: Option<String>,
    /// Gene symbol.
    pub symbol: Option<String>,
    /// Transcript identifier, if the record belongs to one.
    pub transcript_id: Option<String>,
    /// HGNC identifier in `HGNC:<n>` form.
    pub hgnc_id: Option<String>,
    /// Contig name after accession remapping.
    pub contig: Option<String>,
}

/// One row of the annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    /// Contig accession or name as given in the file.
    pub seqname: String,
    pub feature_type: FeatureType,
    /// 1-based start position.
    pub start: u64,
    /// 1-based, inclusive end position.
    pub end: u64,
    pub strand: Strand,
    pub attributes: Attributes,
    /// Convenience fields filled by extraction.
    pub resolved: Resolved,
}

impl FeatureRecord {
    /// Parse one tab-separated GTF line.
    ///
    /// Returns `Ok(None)` for feature types that are not materialized; their attribute
    /// column is never tokenized.
    pub fn parse_line(line: &str, line_no: usize, dialect: Dialect) -> Result<Option<Self>, Error> {
        let malformed = |reason: String| Error::MalformedRecord { line_no, reason };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 9 {
            return Err(malformed(format!(
                "expected 9 tab-separated columns, found {}",
                fields.len()
            )));
        }
        let feature_type = match FeatureType::from_column(fields[2]) {
            Some(feature_type) => feature_type,
            None => return Ok(None),
        };
        let start: u64 = fields[3]
            .parse()
            .map_err(|e| malformed(format!("invalid start {:?}: {}", fields[3], e)))?;
        let end: u64 = fields[4]
            .parse()
            .map_err(|e| malformed(format!("invalid end {:?}: {}", fields[4], e)))?;
        if start == 0 || start > end {
            return Err(malformed(format!("invalid interval {}-{}", start, end)));
        }
        let strand = fields[6]
            .parse()
            .map_err(|e: anyhow::Error| malformed(e.to_string()))?;

        Ok(Some(Self {
            seqname: fields[0].to_string(),
            feature_type,
            start,
            end,
            strand,
            attributes: Attributes::parse(fields[8], dialect)?,
            resolved: Resolved::default(),
        }))
    }

    /// The contig name, after remapping where applicable.
    pub fn contig(&self) -> &str {
        self.resolved.contig.as_deref().unwrap_or(&self.seqname)
    }

    /// Value of a required attribute.
    pub fn require_attr(&self, name: &str) -> Result<&str, Error> {
        self.attributes
            .get_str(name)
            .ok_or_else(|| self.missing_attr(name))
    }

    /// [`Error::MissingAttribute`] for `name` on this record.
    pub fn missing_attr(&self, name: &str) -> Error {
        Error::MissingAttribute {
            name: name.to_string(),
            attributes: format!("{:?}", self.attributes),
        }
    }

    /// Whether this gene record looks like the chrY copy of a pseudoautosomal gene.
    ///
    /// Such copies are labelled with a `_1` suffix in either the symbol or the raw
    /// `gene_id` attribute.
    pub fn is_par_y_copy(&self) -> bool {
        self.contig() == "chrY"
            && (self
                .resolved
                .symbol
                .as_deref()
                .is_some_and(|s| s.ends_with("_1"))
                || self
                    .attributes
                    .get_str("gene_id")
                    .is_some_and(|s| s.ends_with("_1")))
    }
}

/// A reconciled gene, transcript, or CDS entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalRecord {
    pub contig: String,
    /// 1-based start position.
    pub start: u64,
    /// 1-based, inclusive end position.
    pub end: u64,
    pub strand: Strand,
    pub symbol: String,
    pub hgnc_id: Option<String>,
    pub gene_id: String,
    pub transcript_id: Option<String>,
    /// Owning feature type, distinguishes CDS from stop codon rows.
    pub feature_type: FeatureType,
}

impl CanonicalRecord {
    /// HGNC identifier or the `"NA"` sentinel.
    pub fn hgnc_id_or_na(&self) -> &str {
        self.hgnc_id.as_deref().unwrap_or(NA)
    }

    /// Transcript identifier or the `"NA"` sentinel.
    pub fn transcript_id_or_na(&self) -> &str {
        self.transcript_id.as_deref().unwrap_or(NA)
    }
}

impl TryFrom<&FeatureRecord> for CanonicalRecord {
    type Error = Error;

    fn try_from(record: &FeatureRecord) -> Result<Self, Self::Error> {
        let Resolved {
            gene_id,
            symbol,
            transcript_id,
            hgnc_id,
            ..
        } = &record.resolved;
        Ok(Self {
            contig: record.contig().to_string(),
            start: record.start,
            end: record.end,
            strand: record.strand,
            symbol: symbol.clone().ok_or_else(|| record.missing_attr("gene_name"))?,
            hgnc_id: hgnc_id.clone(),
            gene_id: gene_id.clone().ok_or_else(|| record.missing_attr("gene_id"))?,
            transcript_id: transcript_id.clone(),
            feature_type: record.feature_type,
        })
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{FeatureRecord, FeatureType, Strand};
    use crate::annotation::attrs::Dialect;
    use crate::error::Error;

    const CDS_LINE: &str = "chr17\tHAVANA\tCDS\t43045678\t43045802\t.\t-\t0\t\
        gene_id \"ENSG00000012048.23\"; transcript_id \"ENST00000357654.9\"; \
        gene_name \"BRCA1\"; hgnc_id \"HGNC:1100\"; tag \"basic\"; tag \"Ensembl_canonical\";";

    #[test]
    fn parse_cds_line() -> Result<(), anyhow::Error> {
        let record = FeatureRecord::parse_line(CDS_LINE, 1, Dialect::ESCAPED)?.unwrap();

        assert_eq!(record.seqname, "chr17");
        assert_eq!(record.feature_type, FeatureType::Cds);
        assert_eq!((record.start, record.end), (43045678, 43045802));
        assert_eq!(record.strand, Strand::Minus);
        assert_eq!(record.require_attr("gene_name")?, "BRCA1");
        assert!(record.attributes.has_value("tag", "Ensembl_canonical"));

        Ok(())
    }

    #[test]
    fn skip_unused_feature_without_tokenizing() -> Result<(), anyhow::Error> {
        let line = "chr17\tHAVANA\texon\t1\t10\t.\t-\t.\tgene_id \"unbalanced;";

        assert!(FeatureRecord::parse_line(line, 1, Dialect::ESCAPED)?.is_none());

        Ok(())
    }

    #[rstest::rstest]
    #[case("chr1\tx\tgene\t10\t5\t.\t+\t.\tgene_id \"A\";")]
    #[case("chr1\tx\tgene\t0\t5\t.\t+\t.\tgene_id \"A\";")]
    #[case("chr1\tx\tgene\t1\t5\t.\t.\t.\tgene_id \"A\";")]
    #[case("chr1\tx\tgene\t1\t5\t.\t+")]
    fn malformed_line(#[case] line: &str) {
        assert!(matches!(
            FeatureRecord::parse_line(line, 7, Dialect::ESCAPED),
            Err(Error::MalformedRecord { line_no: 7, .. })
        ));
    }

    #[test]
    fn missing_required_attribute() -> Result<(), anyhow::Error> {
        let record = FeatureRecord::parse_line(CDS_LINE, 1, Dialect::ESCAPED)?.unwrap();

        assert!(matches!(
            record.require_attr("protein_id"),
            Err(Error::MissingAttribute { name, .. }) if name == "protein_id"
        ));

        Ok(())
    }
}
