//! Steamstats pipeline - per-identifier fetch, merge and export

pub mod context;
pub mod options;
pub mod runner;
pub mod summary;

pub use context::RunContext;
pub use options::RunOptions;
pub use runner::{RunOutput, Runner};
pub use summary::{RunSummary, SourceStats};
