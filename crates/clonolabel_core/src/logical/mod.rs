//! Lazy logical plans.
//!
//! Every node computes and stores its output schema at construction, so type
//! errors surface while the plan is being built rather than when it runs.

pub mod logical_filter;
pub mod logical_join;
pub mod logical_project;
pub mod logical_scan;
pub mod logical_window;
pub mod operator;
