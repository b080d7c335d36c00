//! Run options

use std::path::PathBuf;
use std::time::Duration;

use steamstats_sources::steam::batch::MAX_BATCH;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Call the slow name/price sources
    pub extra_data: bool,
    /// Use the batch catalog endpoint, falling back to single lookups
    pub use_batch: bool,
    /// Identifiers per batch request (capped at the endpoint maximum)
    pub batch_size: usize,
    /// Flush the main table every N rows
    pub flush_every: usize,
    /// Delay between identifiers
    pub pace: Duration,
    /// Also write one file per identifier into `export_dir`
    pub separate_export: bool,
    pub export_dir: PathBuf,
    /// Main table; `None` keeps records in memory only
    pub output_path: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            extra_data: false,
            use_batch: true,
            batch_size: MAX_BATCH,
            flush_every: 10,
            pace: Duration::from_secs(1),
            separate_export: false,
            export_dir: PathBuf::from("Exports"),
            output_path: None,
        }
    }
}

impl RunOptions {
    /// Batch size actually used: 1 in single mode, else clamped to 1..=MAX_BATCH
    pub fn effective_batch_size(&self) -> usize {
        if self.use_batch {
            self.batch_size.clamp(1, MAX_BATCH)
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_clamped() {
        let mut opts = RunOptions {
            batch_size: 5000,
            ..Default::default()
        };
        assert_eq!(opts.effective_batch_size(), MAX_BATCH);
        opts.batch_size = 0;
        assert_eq!(opts.effective_batch_size(), 1);
        opts.use_batch = false;
        opts.batch_size = 50;
        assert_eq!(opts.effective_batch_size(), 1);
    }
}
