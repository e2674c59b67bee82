//! Lifecycle events of a subsetting pass.
//!
//! The pass itself never logs progress; it reports to a [`SubsetObserver`]
//! at fixed points and the observer decides what to do with them.
//! [`LogObserver`] forwards everything to the `log` facade.

use std::fmt;

use log::{debug, info};

use crate::species::Species;

/// Something that happened during a subsetting pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubsetEvent {
    /// A species dataset is about to be filtered
    DatasetStarted { path: String, species: Species },
    /// The reads for a dataset have been planned
    RangesPlanned {
        path: String,
        ranges: usize,
        rows: usize,
    },
    /// A filtered dataset has been written
    DatasetFinished {
        path: String,
        rows: usize,
        bytes: usize,
    },
    /// A subtree without particle data was copied verbatim
    SubtreeCopied { path: String, bytes: usize },
}

impl fmt::Display for SubsetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubsetEvent::DatasetStarted { path, species } => {
                write!(f, "filtering {path} ({species})")
            }
            SubsetEvent::RangesPlanned { path, ranges, rows } => {
                write!(f, "{path}: {rows} rows in {ranges} ranges")
            }
            SubsetEvent::DatasetFinished { path, rows, bytes } => {
                write!(f, "wrote {path}: {rows} rows, {bytes} bytes")
            }
            SubsetEvent::SubtreeCopied { path, bytes } => {
                write!(f, "copied {path}: {bytes} bytes")
            }
        }
    }
}

/// Receives the events of a subsetting pass
pub trait SubsetObserver {
    fn on_event(&self, event: &SubsetEvent);
}

/// Forwards events to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl SubsetObserver for LogObserver {
    fn on_event(&self, event: &SubsetEvent) {
        match event {
            SubsetEvent::DatasetStarted { .. } | SubsetEvent::RangesPlanned { .. } => {
                debug!("{event}")
            }
            SubsetEvent::DatasetFinished { .. } | SubsetEvent::SubtreeCopied { .. } => {
                info!("{event}")
            }
        }
    }
}

impl<O: SubsetObserver + ?Sized> SubsetObserver for &O {
    fn on_event(&self, event: &SubsetEvent) {
        (**self).on_event(event)
    }
}
