//! Indices over reconciled records.

use indexmap::IndexMap;

use crate::annotation::record::CanonicalRecord;
use crate::error::Error;

/// Outcome of inserting a record into an [`AnnotationIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Inserted,
    /// The record was the chrY copy of an already indexed pseudoautosomal entry.
    SuppressedParDuplicate,
}

/// Genes keyed by gene identifier, transcripts keyed by transcript identifier, and CDS/stop
/// codon groups keyed by transcript identifier.
///
/// The chrY copies of pseudoautosomal genes are detected by the caller (see
/// [`FeatureRecord::is_par_y_copy`](crate::annotation::FeatureRecord::is_par_y_copy)) and
/// dropped in favour of the first seen entry; any other repeated key is an error.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    genes: IndexMap<String, CanonicalRecord>,
    transcripts: IndexMap<String, CanonicalRecord>,
    cds: IndexMap<String, Vec<CanonicalRecord>>,
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a gene record, keyed by gene identifier.
    pub fn insert_gene(
        &mut self,
        record: CanonicalRecord,
        is_par_y_copy: bool,
    ) -> Result<Insertion, Error> {
        if self.genes.contains_key(&record.gene_id) {
            return suppress_or_fail(&record, is_par_y_copy, "gene identifier", &record.gene_id);
        }
        self.genes.insert(record.gene_id.clone(), record);
        Ok(Insertion::Inserted)
    }

    /// Insert a transcript record, keyed by transcript identifier.
    pub fn insert_transcript(
        &mut self,
        record: CanonicalRecord,
        is_par_y_copy: bool,
    ) -> Result<Insertion, Error> {
        let transcript_id = required_transcript_id(&record)?;
        if self.transcripts.contains_key(&transcript_id) {
            return suppress_or_fail(&record, is_par_y_copy, "transcript identifier", &transcript_id);
        }
        self.transcripts.insert(transcript_id, record);
        Ok(Insertion::Inserted)
    }

    /// Append a CDS or stop codon record to the group of its transcript.
    ///
    /// All records of one transcript must agree on the gene identifier.  A chrY copy is
    /// dropped if the group already holds records from another contig.
    pub fn insert_cds(
        &mut self,
        record: CanonicalRecord,
        is_par_y_copy: bool,
    ) -> Result<Insertion, Error> {
        let transcript_id = required_transcript_id(&record)?;
        let group = self.cds.entry(transcript_id.clone()).or_default();
        if let Some(first) = group.first() {
            if is_par_y_copy && first.contig != record.contig {
                tracing::trace!("suppressing chrY copy of CDS of {}", &transcript_id);
                return Ok(Insertion::SuppressedParDuplicate);
            }
            if first.gene_id != record.gene_id {
                return Err(Error::InconsistentValue {
                    kind: "gene identifier of CDS",
                    key: transcript_id,
                    first: first.gene_id.clone(),
                    second: record.gene_id,
                });
            }
        }
        group.push(record);
        Ok(Insertion::Inserted)
    }

    /// Gene record by gene identifier.
    pub fn gene(&self, gene_id: &str) -> Option<&CanonicalRecord> {
        self.genes.get(gene_id)
    }

    /// All gene records in insertion order.
    pub fn genes(&self) -> impl Iterator<Item = &CanonicalRecord> {
        self.genes.values()
    }

    /// All transcript records in insertion order.
    pub fn transcripts(&self) -> impl Iterator<Item = &CanonicalRecord> {
        self.transcripts.values()
    }

    /// CDS group of a transcript.
    pub fn cds(&self, transcript_id: &str) -> Option<&[CanonicalRecord]> {
        self.cds.get(transcript_id).map(|v| v.as_slice())
    }

    /// All CDS groups in insertion order.
    pub fn cds_groups(&self) -> impl Iterator<Item = (&str, &[CanonicalRecord])> {
        self.cds.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn gene_count(&self) -> usize {
        self.genes.len()
    }

    pub fn transcript_count(&self) -> usize {
        self.transcripts.len()
    }

    pub fn cds_count(&self) -> usize {
        self.cds.values().map(Vec::len).sum()
    }

    /// Gene, transcript, and CDS records, each in insertion order.
    pub fn into_parts(
        self,
    ) -> (
        Vec<CanonicalRecord>,
        Vec<CanonicalRecord>,
        Vec<CanonicalRecord>,
    ) {
        (
            self.genes.into_values().collect(),
            self.transcripts.into_values().collect(),
            self.cds.into_values().flatten().collect(),
        )
    }
}

fn suppress_or_fail(
    record: &CanonicalRecord,
    is_par_y_copy: bool,
    kind: &'static str,
    key: &str,
) -> Result<Insertion, Error> {
    if is_par_y_copy {
        tracing::debug!(
            "suppressing chrY pseudoautosomal duplicate of {} {} ({})",
            kind,
            key,
            &record.symbol
        );
        Ok(Insertion::SuppressedParDuplicate)
    } else {
        Err(Error::DuplicateKey {
            kind,
            key: key.to_string(),
        })
    }
}

fn required_transcript_id(record: &CanonicalRecord) -> Result<String, Error> {
    record
        .transcript_id
        .clone()
        .ok_or_else(|| Error::MissingAttribute {
            name: "transcript_id".into(),
            attributes: format!("{:?}", record),
        })
}
