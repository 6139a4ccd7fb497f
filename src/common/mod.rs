//! Commonly used code.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod contig;
pub mod io;

/// Commonly used command line arguments.
#[derive(Parser, Debug, Default)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

/// Sentinel for absent identifiers in input and output tables.
pub const NA: &str = "NA";

/// Returns whether `value` is empty or the `"NA"` sentinel.
pub fn is_na(value: &str) -> bool {
    value.is_empty() || value == NA
}

/// Map empty values and the `"NA"` sentinel to `None`.
pub fn non_na(value: &str) -> Option<&str> {
    if is_na(value) {
        None
    } else {
        Some(value)
    }
}

/// The version of `panelcoords` package.
#[cfg(not(test))]
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// This allows us to override the version to `0.0.0` in tests.
pub fn version() -> &'static str {
    #[cfg(test)]
    return "0.0.0";
    #[cfg(not(test))]
    return VERSION;
}

/// Log progress of a long scan every million lines.
pub fn trace_progress(line_no: usize, what: &str) {
    use thousands::Separable;

    if line_no % 1_000_000 == 0 {
        tracing::debug!("  ... {} {} lines processed", line_no.separate_with_commas(), what);
    }
}
