//! Fixed chromosome order used for sorting output tables.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::error::Error;

/// Canonical chromosome names in output order, `chrM` last.
pub static CHROM_ORDER: Lazy<Vec<String>> = Lazy::new(|| {
    (1..=22)
        .map(|i| format!("chr{}", i))
        .chain(["chrX", "chrY", "chrM"].into_iter().map(String::from))
        .collect()
});

/// Mapping from chromosome name to its position in [`CHROM_ORDER`].
static CHROM_RANK: Lazy<IndexMap<&'static str, usize>> = Lazy::new(|| {
    CHROM_ORDER
        .iter()
        .enumerate()
        .map(|(rank, name)| (name.as_str(), rank))
        .collect()
});

const CHR_M: &str = "chrM";

/// The set of contigs that a table may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContigSet {
    /// chr1-22, chrX, chrY, and chrM.
    WithMitochondrion,
    /// chr1-22, chrX, and chrY.
    Nuclear,
}

impl ContigSet {
    /// Position of `contig` in the chromosome order.
    ///
    /// Contigs outside of the set have no defined position and yield
    /// [`Error::UnrankedContig`].
    pub fn rank(&self, contig: &str) -> Result<usize, Error> {
        match (self, contig) {
            (ContigSet::Nuclear, CHR_M) => Err(Error::UnrankedContig(contig.to_string())),
            _ => CHROM_RANK
                .get(contig)
                .copied()
                .ok_or_else(|| Error::UnrankedContig(contig.to_string())),
        }
    }

    /// Check if the contig is part of the set.
    #[inline]
    pub fn contains(&self, contig: &str) -> bool {
        self.rank(contig).is_ok()
    }
}

#[cfg(test)]
mod test {
    use super::ContigSet;

    #[rstest::rstest]
    #[case("chr1", 0)]
    #[case("chr10", 9)]
    #[case("chr22", 21)]
    #[case("chrX", 22)]
    #[case("chrY", 23)]
    fn rank_nuclear(#[case] contig: &str, #[case] expected: usize) {
        assert_eq!(ContigSet::Nuclear.rank(contig).unwrap(), expected);
        assert_eq!(ContigSet::WithMitochondrion.rank(contig).unwrap(), expected);
    }

    #[test]
    fn rank_mitochondrion() {
        assert_eq!(ContigSet::WithMitochondrion.rank("chrM").unwrap(), 24);
        assert!(!ContigSet::Nuclear.contains("chrM"));
    }

    #[rstest::rstest]
    #[case("1")]
    #[case("chrUn_KI270742v1")]
    #[case("NC_000001.11")]
    fn rank_unknown(#[case] contig: &str) {
        assert!(matches!(
            ContigSet::WithMitochondrion.rank(contig),
            Err(crate::error::Error::UnrankedContig(c)) if c == contig
        ));
    }
}
