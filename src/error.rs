//! Error types for compiling panel coordinate tables.

use std::path::PathBuf;

use itertools::Itertools;

/// Exit status used for runs that fail because of missing panel annotations.
pub const EXIT_MISSING_ANNOTATIONS: u8 = 2;

/// Exit status used for all other fatal errors.
pub const EXIT_FATAL: u8 = 1;

/// Errors raised while reading, reconciling, and emitting annotation data.
///
/// All variants except [`Error::MissingAnnotations`] abort a run immediately.  Missing
/// annotations are collected over the whole panel and reported together.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The attribute column could not be tokenized.
    #[error("malformed attribute string {attributes:?}: {reason}")]
    MalformedAttributes { attributes: String, reason: String },
    /// A required attribute is absent from a record.
    #[error("missing required attribute {name:?} in {attributes:?}")]
    MissingAttribute { name: String, attributes: String },
    /// A line does not have the expected column layout.
    #[error("malformed record at line {line_no}: {reason}")]
    MalformedRecord { line_no: usize, reason: String },
    /// A key expected to be unique appeared twice.
    #[error("duplicate {kind} {key:?}")]
    DuplicateKey { kind: &'static str, key: String },
    /// Two records disagree on a value that must be shared.
    #[error("inconsistent {kind} for {key:?}: {first:?} != {second:?}")]
    InconsistentValue {
        kind: &'static str,
        key: String,
        first: String,
        second: String,
    },
    /// Panel entries without any surviving canonical record.
    #[error("no {kind} found for the following {}:\n{}", plural(.ids), itemize(.ids))]
    MissingAnnotations { kind: &'static str, ids: Vec<String> },
    /// The contig has no position in the chromosome order.
    #[error("contig {0:?} has no position in the chromosome order")]
    UnrankedContig(String),
    /// An input path does not exist.
    #[error("input file {} does not exist", .0.display())]
    InputNotFound(PathBuf),
    /// A gene role could not be interpreted.
    #[error("unknown gene role {role:?} for {gene:?}")]
    UnknownRole { gene: String, role: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

fn plural(ids: &[String]) -> &'static str {
    if ids.len() == 1 {
        "entry"
    } else {
        "entries"
    }
}

fn itemize(ids: &[String]) -> String {
    ids.iter().map(|id| format!("  - {}", id)).join("\n")
}

impl Error {
    /// The process exit status to use when terminating because of this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::MissingAnnotations { .. } => EXIT_MISSING_ANNOTATIONS,
            _ => EXIT_FATAL,
        }
    }
}

/// Fail with [`Error::InputNotFound`] unless all given paths exist.
pub fn require_inputs<'a, I, P>(paths: I) -> Result<(), Error>
where
    I: IntoIterator<Item = &'a P>,
    P: AsRef<std::path::Path> + 'a + ?Sized,
{
    for path in paths {
        if !path.as_ref().exists() {
            return Err(Error::InputNotFound(path.as_ref().to_path_buf()));
        }
    }
    Ok(())
}
