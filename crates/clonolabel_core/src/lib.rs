//! Rule based labeling of immune repertoire clonotypes.
//!
//! Input tables are read lazily through [`dataset::ColumnarDataset`], a small
//! columnar engine whose plans are type checked as they are built. An
//! [`annotate::Annotator`] turns an annotation script into such a plan.

pub mod annotate;
pub mod arrays;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod execution;
pub mod explain;
pub mod expr;
pub mod logical;
pub mod schema;
pub mod script;
pub mod storage;
