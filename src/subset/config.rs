use serde::{Deserialize, Serialize};

/// Default rows per fine-filter partition
pub const DEFAULT_PARTITION_ROWS: usize = 65_536;

/// Execution settings for a subsetting pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsetConfig {
    /// Fan range reads and fine filtering out over a worker pool
    pub parallel: bool,

    /// Size of a dedicated worker pool; `None` shares the global rayon pool
    pub threads: Option<usize>,

    /// Candidate rows per fine-filter partition
    pub partition_rows: usize,
}

impl Default for SubsetConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
            partition_rows: DEFAULT_PARTITION_ROWS,
        }
    }
}

impl SubsetConfig {
    /// Single-threaded execution
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Use a dedicated pool of `threads` workers
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.parallel = true;
        self.threads = Some(threads);
        self
    }

    pub fn with_partition_rows(mut self, rows: usize) -> Self {
        self.partition_rows = rows.max(1);
        self
    }
}
