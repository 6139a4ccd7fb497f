//! Identifier newtypes.

use nutype::nutype;
use once_cell::sync::Lazy;
use regex::Regex;

/// Trailing `.<version>` of a transcript accession.
static RE_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\d+$").expect("invalid regex"));

#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(
        Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, AsRef, Deref, Borrow, Into,
        Display
    )
)]
pub struct TranscriptId(String);

impl TranscriptId {
    /// The accession with a trailing numeric version removed, e.g. `NM_007294.4` to
    /// `NM_007294`.  Suffixes such as `_PAR_Y` are kept.
    pub fn without_version(&self) -> Result<Self, TranscriptIdError> {
        Self::try_new(RE_VERSION.replace(self.as_ref(), "").into_owned())
    }
}

#[cfg(test)]
mod test {
    use super::TranscriptId;

    #[rstest::rstest]
    #[case("ENST00000357654.9", "ENST00000357654")]
    #[case("NM_007294.4", "NM_007294")]
    #[case("ENST00000357654", "ENST00000357654")]
    #[case("ENST00000381192.10_PAR_Y", "ENST00000381192.10_PAR_Y")]
    fn without_version(#[case] raw: &str, #[case] expected: &str) -> Result<(), anyhow::Error> {
        let id = TranscriptId::try_new(raw)?;

        assert_eq!(id.without_version()?.as_ref(), expected);

        Ok(())
    }

    #[test]
    fn empty_is_rejected() {
        assert!(TranscriptId::try_new("  ").is_err());
    }
}
