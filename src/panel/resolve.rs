//! Mapping of panel entries onto canonical gene, transcript, and CDS records.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use crate::annotation::Source;
use crate::error::Error;
use crate::panel::{Exclusions, PanelEntry};
use crate::tables::{CdsTableRow, GeneDataRow, TranscriptBedRow};
use crate::xref::XrefTable;

/// Fails on a repeated key.
struct SeenSet<T> {
    kind: &'static str,
    seen: HashSet<T>,
}

impl<T: std::hash::Hash + Eq + std::fmt::Debug> SeenSet<T> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            seen: HashSet::new(),
        }
    }

    fn insert(&mut self, value: T) -> Result<(), Error> {
        if self.seen.contains(&value) {
            return Err(Error::DuplicateKey {
                kind: self.kind,
                key: format!("{:?}", value),
            });
        }
        self.seen.insert(value);
        Ok(())
    }
}

/// Missing entries, reported together once the whole panel has been processed.
struct Missing {
    kind: &'static str,
    ids: Vec<String>,
}

impl Missing {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            ids: Vec::new(),
        }
    }

    /// Record a missing entry unless `excluded`.
    fn report(&mut self, id: String, excluded: bool) {
        if excluded {
            tracing::debug!("skipping excluded {} entry {}", self.kind, id);
        } else {
            self.ids.push(id);
        }
    }

    fn into_result<T>(self, value: T) -> Result<T, Error> {
        if self.ids.is_empty() {
            Ok(value)
        } else {
            Err(Error::MissingAnnotations {
                kind: self.kind,
                ids: self.ids,
            })
        }
    }
}

/// Resolves panel entries against canonical tables.
///
/// Any entry that cannot be resolved is collected and reported in one
/// [`Error::MissingAnnotations`] unless it is listed in the [`Exclusions`].  Entries that
/// resolve to a record already seen are an error.
#[derive(Debug, Clone, Copy)]
pub struct PanelResolver<'a> {
    exclusions: &'a Exclusions,
}

impl<'a> PanelResolver<'a> {
    pub fn new(exclusions: &'a Exclusions) -> Self {
        Self { exclusions }
    }

    /// One gene record per entry: Ensembl if the entry has an Ensembl gene ID, else RefSeq.
    pub fn genes(
        &self,
        panel: &[PanelEntry],
        ensembl: &XrefTable<GeneDataRow>,
        refseq: &XrefTable<GeneDataRow>,
    ) -> Result<Vec<GeneDataRow>, Error> {
        let mut seen_gene_ids = SeenSet::new("panel gene identifier");
        let mut seen_hgnc_ids = SeenSet::new("panel HGNC identifier");
        let mut seen_records = SeenSet::new("panel gene record");
        let mut missing = Missing::new("genes");

        let mut result = Vec::new();
        for entry in panel {
            let lookup = match (&entry.ensembl_gene_id, &entry.ncbi_gene_id) {
                (Some(gene_id), _) => Some((gene_id, ensembl.get(gene_id))),
                (None, Some(gene_id)) => Some((gene_id, refseq.get(gene_id))),
                (None, None) => None,
            };
            let (gene_id, gene) = match lookup {
                Some((gene_id, Some(gene))) => (gene_id, gene),
                Some((gene_id, None)) => {
                    missing.report(gene_id.clone(), self.exclusions.gene_excluded(entry));
                    continue;
                }
                None => {
                    missing.report(entry.label(), self.exclusions.gene_excluded(entry));
                    continue;
                }
            };

            seen_gene_ids.insert(gene_id.clone())?;
            if let Some(hgnc_id) = crate::common::non_na(&gene.hgnc_id) {
                seen_hgnc_ids.insert(hgnc_id.to_string())?;
            }
            seen_records.insert(gene.clone())?;
            result.push(gene.clone());
        }
        missing.into_result(result)
    }

    /// All transcripts of the panel genes; every gene must have at least one.
    ///
    /// Genes are matched by their Ensembl or NCBI gene ID, depending on `source`.  The
    /// transcript tables only hold APPRIS coding transcripts, so genes on either exclusion
    /// list may be absent.
    pub fn transcripts(
        &self,
        panel: &[PanelEntry],
        source: Source,
        transcripts: Vec<TranscriptBedRow>,
    ) -> Result<Vec<TranscriptBedRow>, Error> {
        let mut missing = Missing::new("transcripts");

        let mut wanted: IndexMap<&str, &PanelEntry> = IndexMap::new();
        for entry in panel {
            let gene_id = match source {
                Source::Ensembl => entry.ensembl_gene_id.as_deref(),
                Source::Refseq => entry.ncbi_gene_id.as_deref(),
            };
            match gene_id {
                Some(gene_id) => {
                    wanted.insert(gene_id, entry);
                }
                None => missing.report(entry.label(), self.exclusions.cds_excluded(entry)),
            }
        }

        let mut seen: IndexSet<String> = IndexSet::new();
        let result: Vec<_> = transcripts
            .into_iter()
            .filter(|transcript| wanted.contains_key(transcript.info.gene_id.as_str()))
            .inspect(|transcript| {
                seen.insert(transcript.info.gene_id.clone());
            })
            .collect();

        for (gene_id, entry) in &wanted {
            if !seen.contains(*gene_id) {
                missing.report(gene_id.to_string(), self.exclusions.cds_excluded(entry));
            }
        }
        missing.into_result(result)
    }

    /// CDS of each entry's canonical transcript.
    ///
    /// The Ensembl CDS of the entry's `ensembl_transcript_id` (or of the canonical transcript
    /// from `ensembl_genes`) are preferred; MANE Select CDS keyed by HGNC ID are the fallback.
    pub fn cds(
        &self,
        panel: &[PanelEntry],
        ensembl_cds: &IndexMap<String, Vec<CdsTableRow>>,
        mane_cds: &IndexMap<String, Vec<CdsTableRow>>,
        ensembl_genes: Option<&XrefTable<GeneDataRow>>,
    ) -> Result<Vec<CdsTableRow>, Error> {
        let mut seen_transcripts = SeenSet::new("panel transcript identifier");
        let mut seen_gene_ids = SeenSet::new("panel gene identifier");
        let mut seen_hgnc_ids = SeenSet::new("panel HGNC identifier");
        let mut missing = Missing::new("CDS");

        let mut result = Vec::new();
        for entry in panel {
            let transcript_id = entry.ensembl_transcript_id.clone().or_else(|| {
                let gene = ensembl_genes?.get(entry.ensembl_gene_id.as_deref()?)?;
                crate::common::non_na(&gene.transcript_id).map(str::to_string)
            });
            let group = transcript_id
                .as_deref()
                .and_then(|transcript_id| ensembl_cds.get(transcript_id))
                .or_else(|| mane_cds.get(entry.hgnc_id.as_deref()?));
            let Some(group) = group.filter(|group| !group.is_empty()) else {
                missing.report(entry.label(), self.exclusions.cds_excluded(entry));
                continue;
            };

            let first = &group[0].info;
            for row in group {
                for (what, a, b) in [
                    ("transcript identifier", &first.transcript_id, &row.info.transcript_id),
                    ("gene identifier", &first.gene_id, &row.info.gene_id),
                ] {
                    if a != b {
                        return Err(Error::InconsistentValue {
                            kind: what,
                            key: entry.label(),
                            first: a.clone(),
                            second: b.clone(),
                        });
                    }
                }
            }
            seen_transcripts.insert(first.transcript_id.clone())?;
            seen_gene_ids.insert(first.gene_id.clone())?;
            if let Some(hgnc_id) = &first.hgnc_id {
                seen_hgnc_ids.insert(hgnc_id.clone())?;
            }
            result.extend(group.iter().cloned());
        }
        missing.into_result(result)
    }
}

#[cfg(test)]
mod test {
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    use super::PanelResolver;
    use crate::annotation::{Source, Strand};
    use crate::error::Error;
    use crate::panel::{Exclusions, PanelEntry};
    use crate::tables::{group_cds, CdsTableRow, GeneDataRow, RowInfo, TranscriptBedRow};
    use crate::xref::XrefTable;

    fn entry(symbol: &str, hgnc_id: &str, ensembl: Option<&str>, ncbi: Option<&str>) -> PanelEntry {
        PanelEntry {
            symbol: Some(symbol.into()),
            hgnc_id: Some(hgnc_id.into()),
            ensembl_gene_id: ensembl.map(String::from),
            ncbi_gene_id: ncbi.map(String::from),
            ..Default::default()
        }
    }

    fn gene(gene_id: &str, symbol: &str, hgnc_id: &str) -> GeneDataRow {
        GeneDataRow {
            hgnc_id: hgnc_id.into(),
            gene_id: gene_id.into(),
            symbol: symbol.into(),
            transcript_id: "NA".into(),
            contig: "chr7".into(),
            start: 100,
            end: 200,
            strand: Strand::Plus,
        }
    }

    fn genes(rows: Vec<GeneDataRow>) -> XrefTable<GeneDataRow> {
        let mut table = XrefTable::new("gene data identifier");
        for row in rows {
            table.insert(row.gene_id.clone(), row).unwrap();
        }
        table
    }

    fn exclusions(genes: &[&str], cds: &[&str]) -> Exclusions {
        Exclusions {
            release: "test".into(),
            genes: genes.iter().map(|s| s.to_string()).collect(),
            cds: cds.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn genes_prefer_ensembl() -> Result<(), anyhow::Error> {
        let ensembl = genes(vec![gene("ENSG00000133703.12", "KRAS", "HGNC:6407")]);
        let refseq = genes(vec![
            gene("3845", "KRAS", "HGNC:6407"),
            gene("6957", "TRB", "HGNC:12155"),
        ]);
        let panel = vec![
            entry("KRAS", "HGNC:6407", Some("ENSG00000133703.12"), Some("3845")),
            entry("TRB", "HGNC:12155", None, Some("6957")),
        ];
        let exclusions = exclusions(&[], &[]);

        let resolved = PanelResolver::new(&exclusions).genes(&panel, &ensembl, &refseq)?;

        assert_eq!(
            resolved.iter().map(|g| g.gene_id.as_str()).collect::<Vec<_>>(),
            vec!["ENSG00000133703.12", "6957"]
        );

        Ok(())
    }

    #[test]
    fn missing_genes_are_aggregated_unless_excluded() {
        let empty = genes(vec![]);
        let panel = vec![
            entry("GENE1", "HGNC:1", Some("ENSG00000000001.1"), None),
            entry("GENE2", "HGNC:2", Some("ENSG00000000002.1"), None),
        ];

        let none = exclusions(&[], &[]);
        let result = PanelResolver::new(&none).genes(&panel, &empty, &empty);
        assert!(matches!(
            result,
            Err(Error::MissingAnnotations { ref ids, .. })
                if ids == &["ENSG00000000001.1", "ENSG00000000002.1"]
        ));

        let both = exclusions(&["HGNC:1", "ENSG00000000002.1"], &[]);
        let result = PanelResolver::new(&both).genes(&panel, &empty, &empty);
        assert!(matches!(result, Ok(ref genes) if genes.is_empty()));
    }

    #[test]
    fn duplicate_hgnc_is_fatal() {
        let ensembl = genes(vec![
            gene("ENSG00000000001.1", "A", "HGNC:1"),
            gene("ENSG00000000002.1", "A", "HGNC:1"),
        ]);
        let panel = vec![
            entry("A", "HGNC:1", Some("ENSG00000000001.1"), None),
            entry("A", "HGNC:1", Some("ENSG00000000002.1"), None),
        ];
        let exclusions = exclusions(&[], &[]);

        let result = PanelResolver::new(&exclusions).genes(&panel, &ensembl, &genes(vec![]));

        assert!(matches!(
            result,
            Err(Error::DuplicateKey { kind: "panel HGNC identifier", .. })
        ));
    }

    fn transcript(gene_id: &str, transcript_id: &str) -> TranscriptBedRow {
        let info_raw = format!("X;;{};{}", gene_id, transcript_id);
        TranscriptBedRow {
            contig: "chr1".into(),
            start0: 10,
            end: 20,
            info: info_raw.parse().unwrap(),
            info_raw,
            strand: Strand::Plus,
        }
    }

    #[test]
    fn transcripts_of_panel_genes() -> Result<(), anyhow::Error> {
        let transcripts = vec![
            transcript("ENSG1", "ENST1"),
            transcript("ENSG2", "ENST2"),
            transcript("ENSG1", "ENST3"),
        ];
        let panel = vec![entry("A", "HGNC:1", Some("ENSG1"), None)];
        let exclusions = exclusions(&[], &[]);

        let resolved =
            PanelResolver::new(&exclusions).transcripts(&panel, Source::Ensembl, transcripts)?;

        assert_eq!(
            resolved
                .iter()
                .map(|t| t.info.transcript_id.as_str())
                .collect::<Vec<_>>(),
            vec!["ENST1", "ENST3"]
        );

        Ok(())
    }

    #[test]
    fn transcripts_report_all_missing_genes() {
        let panel = vec![
            entry("A", "HGNC:1", Some("ENSG1"), None),
            entry("B", "HGNC:2", Some("ENSG2"), None),
            entry("C", "HGNC:3", Some("ENSG3"), None),
        ];
        let exclusions = exclusions(&[], &[]);

        let result = PanelResolver::new(&exclusions).transcripts(
            &panel,
            Source::Ensembl,
            vec![transcript("ENSG2", "ENST2")],
        );

        assert!(matches!(
            result,
            Err(Error::MissingAnnotations { kind: "transcripts", ref ids })
                if ids == &["ENSG1", "ENSG3"]
        ));
    }

    fn cds_row(hgnc_id: &str, gene_id: &str, transcript_id: &str, start: u64) -> CdsTableRow {
        CdsTableRow {
            contig: "chr1".into(),
            start,
            end: start + 10,
            info: RowInfo {
                symbol: "X".into(),
                hgnc_id: Some(hgnc_id.into()),
                gene_id: gene_id.into(),
                transcript_id: transcript_id.into(),
            },
            strand: Strand::Plus,
        }
    }

    #[test]
    fn cds_prefer_ensembl_then_mane() -> Result<(), anyhow::Error> {
        let ensembl_cds = group_cds(
            vec![
                cds_row("HGNC:1", "ENSG1", "ENST1", 10),
                cds_row("HGNC:1", "ENSG1", "ENST1", 50),
            ],
            |row| Some(row.info.transcript_id.as_str()),
        );
        let mane_cds = group_cds(
            vec![
                cds_row("HGNC:1", "1", "NM_1.1", 10),
                cds_row("HGNC:2", "2", "NM_2.1", 90),
            ],
            |row| row.info.hgnc_id.as_deref(),
        );
        let ensembl_genes = {
            let mut g = gene("ENSG1", "A", "HGNC:1");
            g.transcript_id = "ENST1".into();
            genes(vec![g])
        };
        let panel = vec![
            entry("A", "HGNC:1", Some("ENSG1"), Some("1")),
            entry("B", "HGNC:2", None, Some("2")),
        ];
        let exclusions = exclusions(&[], &[]);

        let resolved = PanelResolver::new(&exclusions).cds(
            &panel,
            &ensembl_cds,
            &mane_cds,
            Some(&ensembl_genes),
        )?;

        assert_eq!(
            resolved
                .iter()
                .map(|r| (r.info.transcript_id.as_str(), r.start))
                .collect::<Vec<_>>(),
            vec![("ENST1", 10), ("ENST1", 50), ("NM_2.1", 90)]
        );

        Ok(())
    }

    #[test]
    fn cds_missing_and_excluded() {
        let panel = vec![
            entry("H19", "HGNC:4713", Some("ENSG00000130600.20"), None),
            entry("X", "HGNC:9", Some("ENSG9"), None),
        ];
        let exclusions = exclusions(&[], &["ENSG00000130600.20"]);

        let result =
            PanelResolver::new(&exclusions).cds(&panel, &IndexMap::new(), &IndexMap::new(), None);

        assert!(matches!(
            result,
            Err(Error::MissingAnnotations { kind: "CDS", ref ids }) if ids == &["X (HGNC:9)"]
        ));
    }

    #[test]
    fn cds_duplicate_transcript_is_fatal() {
        let ensembl_cds = group_cds(vec![cds_row("HGNC:1", "ENSG1", "ENST1", 10)], |row| {
            Some(row.info.transcript_id.as_str())
        });
        let mut a = entry("A", "HGNC:1", Some("ENSG1"), None);
        a.ensembl_transcript_id = Some("ENST1".into());
        let panel = vec![a.clone(), a];
        let exclusions = exclusions(&[], &[]);

        let result =
            PanelResolver::new(&exclusions).cds(&panel, &ensembl_cds, &IndexMap::new(), None);

        assert!(matches!(
            result,
            Err(Error::DuplicateKey { kind: "panel transcript identifier", .. })
        ));
    }

    #[rstest::rstest]
    #[case(("HGNC:1", "ENSG1"), ("HGNC:2", "ENSG1"), "panel gene identifier")]
    #[case(("HGNC:1", "ENSG1"), ("HGNC:1", "ENSG2"), "panel HGNC identifier")]
    fn cds_duplicate_gene_is_fatal(
        #[case] first: (&str, &str),
        #[case] second: (&str, &str),
        #[case] kind: &str,
    ) {
        let ensembl_cds = group_cds(
            vec![
                cds_row(first.0, first.1, "ENST1", 10),
                cds_row(second.0, second.1, "ENST2", 50),
            ],
            |row| Some(row.info.transcript_id.as_str()),
        );
        let mut a = entry("A", first.0, Some(first.1), None);
        a.ensembl_transcript_id = Some("ENST1".into());
        let mut b = entry("B", second.0, Some(second.1), None);
        b.ensembl_transcript_id = Some("ENST2".into());
        let exclusions = exclusions(&[], &[]);

        let result =
            PanelResolver::new(&exclusions).cds(&[a, b], &ensembl_cds, &IndexMap::new(), None);

        assert!(matches!(
            result,
            Err(Error::DuplicateKey { kind: k, .. }) if k == kind
        ));
    }
}
