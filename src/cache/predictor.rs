//! Pluggable next-access prediction for prefetch.

use std::path::{Path, PathBuf};

use crate::decode;

/// Default number of forward neighbors to predict.
pub const DEFAULT_LOOKAHEAD: usize = 2;

/// Predicts which images the user is likely to view next.
///
/// Implementations must be cheap enough to call on every request; the
/// actual decoding cost is paid by the prefetcher, not here.
pub trait AccessPredictor: Send + Sync {
    /// Record that the user viewed `path`.
    fn record(&self, path: &Path);

    /// Paths likely to be viewed after `current`, most likely first.
    fn predict(&self, current: &Path) -> Vec<PathBuf>;
}

/// Predictor that never predicts anything.
///
/// Keeps the seam in place for callers that want prefetch driven purely
/// by explicit requests.
#[derive(Debug, Default)]
pub struct NoopPredictor;

impl AccessPredictor for NoopPredictor {
    fn record(&self, _path: &Path) {}

    fn predict(&self, _current: &Path) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// Sequential-neighbor prediction for linear gallery browsing.
///
/// Predicts the next `lookahead` images after the current one in the
/// sorted directory listing, plus the image just behind it (users page
/// backwards too). The directory order is the whole model, so `record`
/// has nothing to learn.
#[derive(Debug)]
pub struct SequentialPredictor {
    lookahead: usize,
}

impl SequentialPredictor {
    pub fn new(lookahead: usize) -> Self {
        Self { lookahead }
    }
}

impl Default for SequentialPredictor {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD)
    }
}

impl AccessPredictor for SequentialPredictor {
    fn record(&self, _path: &Path) {}

    fn predict(&self, current: &Path) -> Vec<PathBuf> {
        let Some(dir) = current.parent() else {
            return Vec::new();
        };
        let Ok(listing) = decode::scan_directory(dir) else {
            return Vec::new();
        };
        let Some(pos) = listing.iter().position(|p| p.as_path() == current) else {
            return Vec::new();
        };

        let mut predicted = Vec::with_capacity(self.lookahead + 1);
        for offset in 1..=self.lookahead {
            if let Some(next) = listing.get(pos + offset) {
                predicted.push(next.clone());
            }
        }
        if pos > 0 {
            predicted.push(listing[pos - 1].clone());
        }
        predicted
    }
}
