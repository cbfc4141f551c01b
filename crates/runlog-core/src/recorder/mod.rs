//! Summary recorders: where tagged, stepped records end up.
//!
//! - `TensorBoardRecorder` writes TensorBoard event files (the default)
//! - `MemoryRecorder` keeps every record in memory

mod memory;
mod tensorboard;

pub use memory::MemoryRecorder;
pub use tensorboard::TensorBoardRecorder;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::Utc;
use ndarray::{ArrayView3, ArrayView5};
use serde::{Deserialize, Serialize};

use crate::error::{LoggerError, Result};
use crate::models::{Figure, ScalarPoint};
use crate::storage;

/// Append-only sink for summary records.
///
/// Every method fails with [`LoggerError::RecorderClosed`] once
/// [`close`](SummaryRecorder::close) has been called.
pub trait SummaryRecorder {
    fn record_scalar(&mut self, tag: &str, value: f64, step: u64) -> Result<()>;

    /// Record a group of scalars meant to share one plot.
    fn record_scalars(
        &mut self,
        main_tag: &str,
        values: &HashMap<String, f64>,
        step: u64,
    ) -> Result<()>;

    /// `image` is `[C, H, W]`.
    fn record_image(&mut self, tag: &str, image: ArrayView3<'_, u8>, step: u64) -> Result<()>;

    /// `frames` is `[N, T, C, H, W]`.
    fn record_video(
        &mut self,
        tag: &str,
        frames: ArrayView5<'_, u8>,
        step: u64,
        fps: u32,
    ) -> Result<()>;

    fn record_figures(&mut self, tag: &str, figures: &[Figure], step: u64) -> Result<()>;

    /// Every scalar recorded so far.
    fn scalars(&self) -> &ScalarHistory;

    fn export_json(&self, path: &Path) -> Result<()> {
        if self.is_closed() {
            return Err(LoggerError::RecorderClosed);
        }
        self.scalars().export_json(path)
    }

    /// Returns once everything recorded so far is in storage.
    fn flush(&mut self) -> Result<()>;

    /// Persist pending writes and release the backend. Closing twice is a no-op.
    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;
}

/// Scalar series by tag, in the order they were recorded.
///
/// Serializes as `{ "tag": [[walltime, step, value], ...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScalarHistory {
    series: BTreeMap<String, Vec<ScalarPoint>>,
}

impl ScalarHistory {
    pub fn push(&mut self, tag: &str, step: u64, value: f64) {
        let walltime = Utc::now().timestamp_micros() as f64 / 1e6;
        self.series
            .entry(tag.to_string())
            .or_default()
            .push(ScalarPoint(walltime, step, value));
    }

    pub fn get(&self, tag: &str) -> Option<&[ScalarPoint]> {
        self.series.get(tag).map(Vec::as_slice)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Number of distinct tags.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn export_json(&self, path: &Path) -> Result<()> {
        storage::save_json(path, self)
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        storage::load_json(path)
    }
}

/// Tag under which one member of a scalar group is stored.
pub(crate) fn group_member_tag(main_tag: &str, key: &str) -> String {
    format!("{main_tag}/{key}")
}
