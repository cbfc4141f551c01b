//! TensorBoard event-file recorder.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ndarray::{ArrayView3, ArrayView5};
use tensorboard_rs::summary_writer::SummaryWriter;
use tracing::debug;

use super::{group_member_tag, ScalarHistory, SummaryRecorder};
use crate::config::LoggerConfig;
use crate::error::{LoggerError, Result};
use crate::media;
use crate::models::Figure;
use crate::storage;

/// Writes records to TensorBoard event files under `log_dir`.
///
/// The event writer hands records to its own I/O thread. Once `max_queue`
/// writes are pending or `flush_interval` has passed since the last flush,
/// whichever comes first, that thread is asked to flush. The interval is
/// checked when a write arrives; there is no background timer.
///
/// An explicit [`flush`](SummaryRecorder::flush) is synchronous: the writer is
/// dropped, which joins its threads, its event files are sealed under a
/// generation suffix and a fresh writer is opened on the same directory.
///
/// The event writer has no video summary, so clips are written as animated
/// GIFs to `<log_dir>/videos/<tag>/step_<step>.gif`.
pub struct TensorBoardRecorder {
    /// `None` once closed.
    writer: Option<SummaryWriter>,
    log_dir: PathBuf,
    scalars: ScalarHistory,
    flush_interval: Duration,
    max_queue: usize,
    pending: usize,
    last_flush: Instant,
    /// Number of sealed event-file generations.
    generation: u64,
}

impl fmt::Debug for TensorBoardRecorder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TensorBoardRecorder")
            .field("log_dir", &self.log_dir)
            .field("closed", &self.writer.is_none())
            .field("pending", &self.pending)
            .field("generation", &self.generation)
            .finish()
    }
}

impl TensorBoardRecorder {
    pub fn new(log_dir: impl AsRef<Path>, flush_interval: Duration, max_queue: usize) -> Result<Self> {
        let log_dir = log_dir.as_ref().to_path_buf();
        storage::ensure_dir(&log_dir)?;
        Ok(Self {
            writer: Some(SummaryWriter::new(&log_dir)),
            log_dir,
            scalars: ScalarHistory::default(),
            flush_interval,
            max_queue: max_queue.max(1),
            pending: 0,
            last_flush: Instant::now(),
            generation: 0,
        })
    }

    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        Self::new(&config.log_dir, config.flush_interval(), config.max_queue)
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Where the clip for (`tag`, `step`) is written.
    pub fn video_path(&self, tag: &str, step: u64) -> PathBuf {
        self.log_dir
            .join("videos")
            .join(storage::sanitize_tag(tag))
            .join(format!("step_{step}.gif"))
    }

    fn writer(&mut self) -> Result<&mut SummaryWriter> {
        self.writer.as_mut().ok_or(LoggerError::RecorderClosed)
    }

    /// Count one write and signal the I/O thread if the queue or interval
    /// limit is reached.
    fn wrote(&mut self) -> Result<()> {
        self.pending += 1;
        if self.pending >= self.max_queue || self.last_flush.elapsed() >= self.flush_interval {
            self.writer()?.flush();
            self.mark_flushed();
        }
        Ok(())
    }

    fn mark_flushed(&mut self) {
        self.pending = 0;
        self.last_flush = Instant::now();
    }
}

impl SummaryRecorder for TensorBoardRecorder {
    fn record_scalar(&mut self, tag: &str, value: f64, step: u64) -> Result<()> {
        self.writer()?.add_scalar(tag, value as f32, step as usize);
        self.scalars.push(tag, step, value);
        self.wrote()
    }

    fn record_scalars(
        &mut self,
        main_tag: &str,
        values: &HashMap<String, f64>,
        step: u64,
    ) -> Result<()> {
        let narrowed: HashMap<String, f32> = values
            .iter()
            .map(|(k, v)| (k.clone(), *v as f32))
            .collect();
        self.writer()?.add_scalars(main_tag, &narrowed, step as usize);
        for (key, value) in values {
            self.scalars.push(&group_member_tag(main_tag, key), step, *value);
        }
        self.wrote()
    }

    fn record_image(&mut self, tag: &str, image: ArrayView3<'_, u8>, step: u64) -> Result<()> {
        let (_, h, w) = image.dim();
        media::check_raster(tag, h, w)?;
        let rgb = media::chw_to_rgb(image)?;
        // The writer builds its raster as width = dim[1], height = dim[2], but
        // stores the summary's height/width fields the other way round.
        // TensorBoard decodes the PNG header for the size, so the image shows
        // correctly; the summary metadata reports the transposed size.
        self.writer()?.add_image(tag, &rgb, &[3, w, h], step as usize);
        self.wrote()
    }

    fn record_video(
        &mut self,
        tag: &str,
        frames: ArrayView5<'_, u8>,
        step: u64,
        fps: u32,
    ) -> Result<()> {
        self.writer()?;
        let path = self.video_path(tag, step);
        media::write_gif(frames, fps, &path)?;
        debug!(tag, step, path = %path.display(), "video written");
        Ok(())
    }

    fn record_figures(&mut self, tag: &str, figures: &[Figure], step: u64) -> Result<()> {
        if figures.is_empty() {
            return Err(LoggerError::EmptyBatch("log_figures"));
        }
        let images: Vec<_> = figures.iter().map(Figure::to_chw).collect();
        let views: Vec<_> = images.iter().map(|im| im.view()).collect();
        let grid = media::tile_horizontal(&views)?;
        self.record_image(tag, grid.view(), step)
    }

    fn scalars(&self) -> &ScalarHistory {
        &self.scalars
    }

    fn flush(&mut self) -> Result<()> {
        let writer = self.writer.take().ok_or(LoggerError::RecorderClosed)?;
        // Dropping joins the I/O threads of the main and per-group writers.
        drop(writer);
        self.generation += 1;
        let sealed = storage::seal_event_files(&self.log_dir, self.generation);
        self.writer = Some(SummaryWriter::new(&self.log_dir));
        self.mark_flushed();
        let sealed = sealed?;
        debug!(
            log_dir = %self.log_dir.display(),
            generation = self.generation,
            sealed,
            "event files flushed"
        );
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            drop(writer);
            debug!(log_dir = %self.log_dir.display(), "summary writer closed");
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.writer.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, Array5};

    fn event_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.contains("tfevents"))
                    .unwrap_or(false)
            })
            .collect()
    }

    #[test]
    fn writes_event_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut rec = TensorBoardRecorder::new(tmp.path(), Duration::from_secs(1), 1).unwrap();

        rec.record_scalar("loss", 0.5, 0).unwrap();
        rec.record_image("obs", Array3::<u8>::from_elem((1, 4, 4), 9).view(), 0)
            .unwrap();
        rec.flush().unwrap();

        let sealed: Vec<_> = event_files(tmp.path())
            .into_iter()
            .filter(|p| p.to_string_lossy().ends_with(".1"))
            .collect();
        assert_eq!(sealed.len(), 1);
        assert!(std::fs::metadata(&sealed[0]).unwrap().len() > 0);
    }

    /// Total size of the event files already sealed by a flush.
    fn sealed_bytes(dir: &Path) -> u64 {
        event_files(dir)
            .iter()
            .filter(|p| !p.to_string_lossy().ends_with(".0"))
            .map(|p| std::fs::metadata(p).unwrap().len())
            .sum()
    }

    #[test]
    fn flush_waits_for_the_writer() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut rec =
            TensorBoardRecorder::new(tmp.path(), Duration::from_secs(3600), 100_000).unwrap();

        for step in 0..300 {
            rec.record_scalar("loss", step as f64 * 0.01, step).unwrap();
        }
        rec.flush().unwrap();
        let after_flush = sealed_bytes(tmp.path());
        // Each scalar event takes well over 20 bytes on disk.
        assert!(after_flush > 300 * 20, "only {after_flush} bytes on disk");

        // A second flush in the same second must not clobber the first file.
        rec.record_scalar("loss", 9.0, 300).unwrap();
        rec.flush().unwrap();
        rec.close().unwrap();
        let sealed: Vec<_> = event_files(tmp.path())
            .into_iter()
            .filter(|p| !p.to_string_lossy().ends_with(".0"))
            .collect();
        assert_eq!(sealed.len(), 2);
        assert!(sealed_bytes(tmp.path()) > after_flush);
    }

    #[test]
    fn grouped_scalars_are_sealed_too() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut rec =
            TensorBoardRecorder::new(tmp.path(), Duration::from_secs(3600), 100_000).unwrap();
        let values = HashMap::from([("actor".to_string(), 0.1), ("critic".to_string(), 0.2)]);
        rec.record_scalars("loss", &values, 0).unwrap();
        rec.flush().unwrap();

        let group_dir = tmp.path().join("loss").join("actor");
        assert!(sealed_bytes(&group_dir) > 0);
    }

    #[test]
    fn zero_sized_images_are_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut rec = TensorBoardRecorder::new(tmp.path(), Duration::from_secs(1), 1).unwrap();
        assert!(matches!(
            rec.record_image("empty", Array3::<u8>::zeros((3, 4, 0)).view(), 0),
            Err(LoggerError::ShapeMismatch(_))
        ));
        let flat = Figure::new(0, 5, Vec::new()).unwrap();
        assert!(matches!(
            rec.record_figures("flat", &[flat], 0),
            Err(LoggerError::ShapeMismatch(_))
        ));
        // The recorder is still usable afterwards.
        rec.record_scalar("loss", 1.0, 0).unwrap();
    }

    #[test]
    fn queue_limit_triggers_flush() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut rec = TensorBoardRecorder::new(tmp.path(), Duration::from_secs(3600), 3).unwrap();

        rec.record_scalar("a", 1.0, 0).unwrap();
        rec.record_scalar("a", 2.0, 1).unwrap();
        assert_eq!(rec.pending, 2);
        rec.record_scalar("a", 3.0, 2).unwrap();
        assert_eq!(rec.pending, 0);
    }

    #[test]
    fn video_lands_as_gif() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut rec = TensorBoardRecorder::new(tmp.path(), Duration::from_secs(1), 1).unwrap();

        let clip = Array5::<u8>::from_elem((2, 3, 3, 4, 4), 200);
        rec.record_video("rollout/train", clip.view(), 7, 10).unwrap();

        let path = rec.video_path("rollout/train", 7);
        assert!(path.ends_with("videos/rollout_train/step_7.gif"));
        assert!(path.exists());
    }

    #[test]
    fn unsupported_channels_are_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut rec = TensorBoardRecorder::new(tmp.path(), Duration::from_secs(1), 1).unwrap();
        let err = rec
            .record_image("bad", Array3::<u8>::zeros((2, 4, 4)).view(), 0)
            .unwrap_err();
        assert!(matches!(err, LoggerError::UnsupportedChannels(2)));
    }

    #[test]
    fn close_is_final() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut rec = TensorBoardRecorder::new(tmp.path(), Duration::from_secs(1), 1).unwrap();
        rec.close().unwrap();
        assert!(rec.is_closed());
        assert!(matches!(
            rec.record_scalar("loss", 1.0, 0),
            Err(LoggerError::RecorderClosed)
        ));
        assert!(matches!(rec.flush(), Err(LoggerError::RecorderClosed)));
        // Closing twice is fine.
        rec.close().unwrap();
    }
}
