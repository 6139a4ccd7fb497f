//! Streaming reader for GTF files.

use std::io::BufRead;
use std::path::Path;

use crate::annotation::attrs::Dialect;
use crate::annotation::record::FeatureRecord;
use crate::common::io::std::open_read_maybe_gz;
use crate::common::trace_progress;
use crate::error::Error;

/// Line-by-line reader yielding materialized [`FeatureRecord`]s.
///
/// Comment lines (including the `###` trailer of RefSeq files), blank lines, and features
/// other than gene, transcript, CDS, and stop codon are skipped.
pub struct GtfReader<R> {
    inner: std::io::Lines<R>,
    dialect: Dialect,
    line_no: usize,
}

impl GtfReader<Box<dyn BufRead>> {
    /// Open the file at `path`, decompressing it if needed.
    pub fn from_path<P: AsRef<Path>>(path: P, dialect: Dialect) -> Result<Self, anyhow::Error> {
        tracing::debug!("Reading {} annotation from {:?}", dialect, path.as_ref());
        Ok(Self::new(open_read_maybe_gz(path)?, dialect))
    }
}

impl<R: BufRead> GtfReader<R> {
    pub fn new(reader: R, dialect: Dialect) -> Self {
        Self {
            inner: reader.lines(),
            dialect,
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for GtfReader<R> {
    type Item = Result<FeatureRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.inner.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            trace_progress(self.line_no, "annotation");

            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match FeatureRecord::parse_line(&line, self.line_no, self.dialect) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
