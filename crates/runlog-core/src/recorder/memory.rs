//! In-memory recorder.

use std::collections::HashMap;

use ndarray::{ArrayView3, ArrayView5};

use super::{group_member_tag, ScalarHistory, SummaryRecorder};
use crate::error::{LoggerError, Result};
use crate::models::{Figure, Record};

/// Keeps every record in a `Vec`. Useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    records: Vec<Record>,
    scalars: ScalarHistory,
    flushes: usize,
    closed: bool,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Records stored under `tag`, oldest first.
    pub fn records_for<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records.iter().filter(move |r| r.tag() == tag)
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    fn push(&mut self, record: Record) -> Result<()> {
        if self.closed {
            return Err(LoggerError::RecorderClosed);
        }
        self.records.push(record);
        Ok(())
    }
}

impl SummaryRecorder for MemoryRecorder {
    fn record_scalar(&mut self, tag: &str, value: f64, step: u64) -> Result<()> {
        self.push(Record::Scalar {
            tag: tag.to_string(),
            value,
            step,
        })?;
        self.scalars.push(tag, step, value);
        Ok(())
    }

    fn record_scalars(
        &mut self,
        main_tag: &str,
        values: &HashMap<String, f64>,
        step: u64,
    ) -> Result<()> {
        self.push(Record::Scalars {
            main_tag: main_tag.to_string(),
            values: values.clone(),
            step,
        })?;
        for (key, value) in values {
            self.scalars.push(&group_member_tag(main_tag, key), step, *value);
        }
        Ok(())
    }

    fn record_image(&mut self, tag: &str, image: ArrayView3<'_, u8>, step: u64) -> Result<()> {
        self.push(Record::Image {
            tag: tag.to_string(),
            image: image.to_owned(),
            step,
        })
    }

    fn record_video(
        &mut self,
        tag: &str,
        frames: ArrayView5<'_, u8>,
        step: u64,
        fps: u32,
    ) -> Result<()> {
        self.push(Record::Video {
            tag: tag.to_string(),
            frames: frames.to_owned(),
            step,
            fps,
        })
    }

    fn record_figures(&mut self, tag: &str, figures: &[Figure], step: u64) -> Result<()> {
        self.push(Record::Figures {
            tag: tag.to_string(),
            figures: figures.to_vec(),
            step,
        })
    }

    fn scalars(&self) -> &ScalarHistory {
        &self.scalars
    }

    fn flush(&mut self) -> Result<()> {
        if self.closed {
            return Err(LoggerError::RecorderClosed);
        }
        self.flushes += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.flushes += 1;
            self.closed = true;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
