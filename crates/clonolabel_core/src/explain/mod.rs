//! Human readable rendering of logical plans.

pub mod explainable;
pub mod node;
