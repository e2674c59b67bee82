//! Worker pool for the fan-out points of a subsetting pass.
//!
//! Work is handed over as a slice of disjoint partitions (row ranges, candidate
//! blocks). Each partition produces an independent partial result; the results
//! come back in input order so the caller merges them with a single
//! deterministic reduction. Nothing is shared mutably while workers run.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::subset::{SubsetConfig, SubsetError};

enum Backend {
    Sequential,
    #[cfg(feature = "parallel")]
    Global,
    #[cfg(feature = "parallel")]
    Dedicated(rayon::ThreadPool),
}

/// Maps partitions to partial results, sequentially or on rayon workers
pub struct WorkerPool {
    backend: Backend,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads())
            .finish()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::sequential()
    }
}

impl WorkerPool {
    /// Run every partition on the calling thread
    pub fn sequential() -> Self {
        Self {
            backend: Backend::Sequential,
        }
    }

    /// Build the pool described by `config`.
    ///
    /// Without the `parallel` feature every configuration runs sequentially.
    pub fn from_config(config: &SubsetConfig) -> Result<Self, SubsetError> {
        if !config.parallel {
            return Ok(Self::sequential());
        }
        Self::build(config.threads)
    }

    #[cfg(feature = "parallel")]
    fn build(threads: Option<usize>) -> Result<Self, SubsetError> {
        let backend = match threads {
            None | Some(0) => Backend::Global,
            Some(1) => Backend::Sequential,
            Some(n) => Backend::Dedicated(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("snapsub-worker-{i}"))
                    .build()
                    .map_err(|e| SubsetError::ThreadPool(e.to_string()))?,
            ),
        };
        Ok(Self { backend })
    }

    #[cfg(not(feature = "parallel"))]
    fn build(threads: Option<usize>) -> Result<Self, SubsetError> {
        if threads.is_some_and(|n| n > 1) {
            log::warn!("Built without the `parallel` feature; running single-threaded");
        }
        Ok(Self::sequential())
    }

    /// Number of workers partitions are spread over
    pub fn threads(&self) -> usize {
        match &self.backend {
            Backend::Sequential => 1,
            #[cfg(feature = "parallel")]
            Backend::Global => rayon::current_num_threads(),
            #[cfg(feature = "parallel")]
            Backend::Dedicated(pool) => pool.current_num_threads(),
        }
    }

    pub fn is_parallel(&self) -> bool {
        self.threads() > 1
    }

    /// Apply `f` to every partition, returning the results in input order.
    ///
    /// The first error aborts the whole map.
    pub fn map<T, R, E, F>(&self, partitions: &[T], f: F) -> Result<Vec<R>, E>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(&T) -> Result<R, E> + Sync + Send,
    {
        match &self.backend {
            Backend::Sequential => partitions.iter().map(f).collect(),
            #[cfg(feature = "parallel")]
            Backend::Global => partitions.par_iter().map(f).collect(),
            #[cfg(feature = "parallel")]
            Backend::Dedicated(pool) => pool.install(|| partitions.par_iter().map(f).collect()),
        }
    }
}
