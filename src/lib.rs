//! panelcoords library main entry point.

pub mod annotation;
pub mod common;
pub mod compile;
pub mod emit;
pub mod error;
pub mod panel;
pub mod tables;
pub mod xref;
