//! Table sources and the delimited file format.

pub mod source;
pub mod tsv;
