//! Compilation of canonical coordinate tables from annotation sources.

pub mod annotations;
pub mod ensembl;
pub mod refseq;
