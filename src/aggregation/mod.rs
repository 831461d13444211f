//! Result aggregation: per-worker tree building and cross-worker merging

pub mod coordinator;
pub mod identity;
pub mod merger;
pub mod tree_builder;

pub use coordinator::{Coordinator, MergeOutcome, RunConfig, RunConfigBuilder};
