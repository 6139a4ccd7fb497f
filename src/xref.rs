//! Flat cross-reference tables: APPRIS calls, contig names, MANE Select, gene roles.

use std::path::Path;

use indexmap::IndexMap;

use crate::common::io::std::open_tsv_reader;
use crate::error::Error;

/// Injective key/value table; a duplicate key on load is an error.
#[derive(Debug, Clone)]
pub struct XrefTable<V> {
    kind: &'static str,
    entries: IndexMap<String, V>,
}

impl<V> XrefTable<V> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    /// Insert a new key, failing with [`Error::DuplicateKey`] if it is present already.
    pub fn insert(&mut self, key: String, value: V) -> Result<(), Error> {
        if self.entries.contains_key(&key) {
            return Err(Error::DuplicateKey {
                kind: self.kind,
                key,
            });
        }
        self.entries.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One row of the APPRIS table.
#[derive(Debug, Clone, serde::Deserialize)]
struct ApprisEntry {
    #[serde(rename = "Transcript ID")]
    transcript_id: String,
    #[serde(rename = "APPRIS Annotation", default)]
    annotation: Option<String>,
}

/// Whether an APPRIS annotation marks a principal or alternative isoform.
pub fn is_appris_qualified(annotation: &str) -> bool {
    annotation.starts_with("PRINCIPAL") || annotation.starts_with("ALTERNATIVE")
}

/// Load APPRIS principal and alternative isoforms, keyed by transcript ID.
pub fn load_appris<P: AsRef<Path>>(path: P) -> Result<XrefTable<String>, anyhow::Error> {
    tracing::info!("Loading APPRIS annotation from {:?}", path.as_ref());
    let mut table = XrefTable::new("APPRIS transcript");
    let mut skipped = 0;
    for result in open_tsv_reader(path, true)?.deserialize() {
        let entry: ApprisEntry = result?;
        match entry.annotation {
            Some(annotation) if is_appris_qualified(&annotation) => {
                table.insert(entry.transcript_id, annotation)?
            }
            _ => skipped += 1,
        }
    }
    tracing::info!(
        "... done loading {} APPRIS transcripts ({} unqualified skipped)",
        table.len(),
        skipped
    );
    Ok(table)
}

/// Load the contig mapping (`name`, `accession`), keyed by accession.
pub fn load_contig_mapping<P: AsRef<Path>>(path: P) -> Result<XrefTable<String>, anyhow::Error> {
    tracing::info!("Loading contig mapping from {:?}", path.as_ref());
    let mut table = XrefTable::new("contig accession");
    for result in open_tsv_reader(path, false)?.deserialize() {
        let (name, accession): (String, String) = result?;
        table.insert(accession, name)?;
    }
    tracing::info!("... done loading {} contig names", table.len());
    Ok(table)
}

/// Load MANE Select transcripts (`ncbi_gene_id`, `refseq_transcript_id`), keyed by gene.
pub fn load_mane_select<P: AsRef<Path>>(path: P) -> Result<XrefTable<String>, anyhow::Error> {
    tracing::info!("Loading MANE Select mapping from {:?}", path.as_ref());
    let mut table = XrefTable::new("MANE Select gene");
    for result in open_tsv_reader(path, false)?.deserialize() {
        let (ncbi_gene_id, transcript_id): (String, String) = result?;
        table.insert(ncbi_gene_id, transcript_id)?;
    }
    tracing::info!("... done loading {} MANE Select transcripts", table.len());
    Ok(table)
}

/// Hartwig driver gene panel: header and likelihood type per gene symbol.
#[derive(Debug, Clone)]
pub struct GeneRoleReference {
    /// Column names of the reference file, reused for output.
    pub header: Vec<String>,
    /// `likelihoodType` by gene symbol.
    pub roles: XrefTable<String>,
}

/// Load the Hartwig driver gene panel.
///
/// Rows whose `gene` is `NA` are skipped.
pub fn load_gene_roles<P: AsRef<Path>>(path: P) -> Result<GeneRoleReference, anyhow::Error> {
    tracing::info!("Loading gene role reference from {:?}", path.as_ref());
    let mut reader = open_tsv_reader(path, true)?;
    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow::anyhow!("missing column {:?} in gene role reference", name))
    };
    let (gene_idx, role_idx) = (column("gene")?, column("likelihoodType")?);

    let mut roles = XrefTable::new("gene role symbol");
    for result in reader.records() {
        let record = result?;
        let gene = record.get(gene_idx).unwrap_or_default();
        if crate::common::is_na(gene) {
            continue;
        }
        roles.insert(
            gene.to_string(),
            record.get(role_idx).unwrap_or_default().to_string(),
        )?;
    }
    tracing::info!("... done loading {} gene roles", roles.len());
    Ok(GeneRoleReference { header, roles })
}
