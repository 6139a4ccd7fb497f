//! Resolution of curated gene panels against the canonical tables.

use std::path::Path;

use serde::Deserialize;

use crate::common::io::std::open_tsv_reader;
use crate::common::non_na;

pub mod cds_bed;
pub mod driver_genes;
pub mod exclusions;
pub mod gene_bed;
pub mod resolve;
pub mod roles;
pub mod transcript_bed;

pub use exclusions::Exclusions;
pub use resolve::PanelResolver;

/// Deserialize empty values and the `NA` sentinel as `None`.
fn na_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(non_na).map(str::to_string))
}

/// One row of a panel gene list.
///
/// Only the columns used by any of the `panel` sub commands are read, all of them optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct PanelEntry {
    #[serde(alias = "ensembl_gene_symbol", default, deserialize_with = "na_as_none")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "na_as_none")]
    pub ensembl_gene_id: Option<String>,
    #[serde(default, deserialize_with = "na_as_none")]
    pub ncbi_gene_id: Option<String>,
    #[serde(default, deserialize_with = "na_as_none")]
    pub hgnc_id: Option<String>,
    /// Canonical Ensembl transcript, if the panel pins one.
    #[serde(default, deserialize_with = "na_as_none")]
    pub ensembl_transcript_id: Option<String>,
    /// `TRUE`, `FALSE`, or `NA`.
    #[serde(default)]
    pub oncogene: Option<String>,
    /// `TRUE`, `FALSE`, or `NA`.
    #[serde(default)]
    pub tsgene: Option<String>,
}

impl PanelEntry {
    /// All identifiers of the entry, used for matching against exclusion lists.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        [&self.hgnc_id, &self.ensembl_gene_id, &self.ncbi_gene_id]
            .into_iter()
            .filter_map(|id| id.as_deref())
    }

    /// Human readable label for error reports, e.g. `H19 (HGNC:4713)`.
    pub fn label(&self) -> String {
        let id = self
            .identifiers()
            .next()
            .unwrap_or(crate::common::NA)
            .to_string();
        match &self.symbol {
            Some(symbol) => format!("{} ({})", symbol, id),
            None => id,
        }
    }
}

/// Read a panel gene list with header.
pub fn read_panel<P: AsRef<Path>>(path: P) -> Result<Vec<PanelEntry>, anyhow::Error> {
    tracing::info!("Reading panel from {:?}", path.as_ref());
    let entries = open_tsv_reader(path, true)?
        .deserialize()
        .collect::<Result<Vec<PanelEntry>, _>>()?;
    tracing::info!("... done reading {} panel entries", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{read_panel, PanelEntry};

    #[test]
    fn read_panel_maps_na_to_none() -> Result<(), anyhow::Error> {
        let entries = read_panel("tests/data/panel/panel.tsv")?;

        let trb = entries
            .iter()
            .find(|e| e.symbol.as_deref() == Some("TRB"))
            .unwrap();
        assert_eq!(trb.ensembl_gene_id, None);
        assert_eq!(trb.ncbi_gene_id.as_deref(), Some("6957"));
        assert_eq!(trb.hgnc_id.as_deref(), Some("HGNC:12155"));
        assert_eq!(trb.tsgene.as_deref(), Some("NA"));

        Ok(())
    }

    #[test]
    fn label_prefers_hgnc() {
        let entry = PanelEntry {
            symbol: Some("H19".into()),
            ensembl_gene_id: Some("ENSG00000130600.20".into()),
            hgnc_id: Some("HGNC:4713".into()),
            ..Default::default()
        };

        assert_eq!(entry.label(), "H19 (HGNC:4713)");
        assert_eq!(
            entry.identifiers().collect::<Vec<_>>(),
            vec!["HGNC:4713", "ENSG00000130600.20"]
        );
    }
}
