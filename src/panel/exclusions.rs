//! Versioned lists of panel genes known to be absent from an annotation release.

use std::path::Path;

use indexmap::IndexSet;

use crate::common::io::std::open_read_maybe_gz;
use crate::error::Error;
use crate::panel::PanelEntry;

/// Exclusions shipped with the crate.
const DEFAULT_EXCLUSIONS: &str = include_str!("../../data/exclusions/ensembl-105.yaml");

/// Identifiers (HGNC, Ensembl, or NCBI gene) whose absence is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct Exclusions {
    /// Annotation release the lists apply to.
    pub release: String,
    /// Genes without any record; their CDS are excluded as well.
    #[serde(default)]
    pub genes: IndexSet<String>,
    /// Genes without coding sequence.
    #[serde(default)]
    pub cds: IndexSet<String>,
}

impl Exclusions {
    /// Load from YAML file, or the built-in default if `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, anyhow::Error> {
        let exclusions: Self = match path {
            Some(path) => {
                tracing::info!("Loading exclusions from {:?}", path);
                serde_yaml::from_reader(open_read_maybe_gz(path)?).map_err(Error::from)?
            }
            None => serde_yaml::from_str(DEFAULT_EXCLUSIONS).map_err(Error::from)?,
        };
        tracing::info!(
            "... using {} exclusions: {} genes, {} CDS",
            &exclusions.release,
            exclusions.genes.len(),
            exclusions.cds.len()
        );
        Ok(exclusions)
    }

    /// Whether a missing gene record for `entry` is expected.
    pub fn gene_excluded(&self, entry: &PanelEntry) -> bool {
        entry.identifiers().any(|id| self.genes.contains(id))
    }

    /// Whether missing CDS for `entry` are expected.
    pub fn cds_excluded(&self, entry: &PanelEntry) -> bool {
        self.gene_excluded(entry) || entry.identifiers().any(|id| self.cds.contains(id))
    }
}
