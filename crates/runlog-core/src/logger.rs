//! The experiment logger: a text log plus a summary recorder for one run.
//!
//! `ExperimentLogger::new()` creates `<log_dir>/log.log`, writes the banner,
//! and opens a TensorBoard recorder rooted at `log_dir`. Every recording call
//! is synchronous and goes straight to the recorder.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::{ArrayView1, ArrayViewD, Ix3, Ix5};
use tracing::{debug, info, warn};

use crate::config::LoggerConfig;
use crate::error::{LoggerError, Result};
use crate::media;
use crate::models::{Figure, Trajectory};
use crate::plot::GraphPlotter;
use crate::recorder::{SummaryRecorder, TensorBoardRecorder};
use crate::storage;
use crate::text::TextLogger;

pub const DEFAULT_FPS: u32 = 10;
pub const DEFAULT_MAX_VIDEOS: usize = 2;
pub const DEFAULT_VIDEO_TITLE: &str = "video";

const BANNER_WIDTH: usize = 80;

/// Text log and summary recorder for a single experiment run.
pub struct ExperimentLogger<R: SummaryRecorder = TensorBoardRecorder> {
    config: LoggerConfig,
    text: TextLogger,
    recorder: R,
    plotter: Option<Box<dyn GraphPlotter>>,
}

impl ExperimentLogger<TensorBoardRecorder> {
    /// Logger for `log_dir` with default settings.
    pub fn new(log_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(LoggerConfig::new(log_dir))
    }

    pub fn with_config(config: LoggerConfig) -> Result<Self> {
        storage::ensure_dir(&config.log_dir)?;
        let recorder = TensorBoardRecorder::from_config(&config)?;
        Self::with_recorder(config, recorder)
    }
}

impl<R: SummaryRecorder> ExperimentLogger<R> {
    /// Logger writing its summaries to `recorder`.
    pub fn with_recorder(config: LoggerConfig, recorder: R) -> Result<Self> {
        storage::ensure_dir(&config.log_dir)?;
        let text = TextLogger::create(config.text_log_path())?;

        let rule = "#".repeat(BANNER_WIDTH);
        text.debug(&rule);
        text.debug(&format!("logging outputs to {}", config.log_dir.display()));
        text.debug(&rule);

        info!(log_dir = %config.log_dir.display(), "ExperimentLogger initialized");

        Ok(Self {
            config,
            text,
            recorder,
            plotter: None,
        })
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn log_dir(&self) -> &Path {
        &self.config.log_dir
    }

    pub fn n_logged_samples(&self) -> usize {
        self.config.n_logged_samples
    }

    pub fn text_logger(&self) -> &TextLogger {
        &self.text
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut R {
        &mut self.recorder
    }

    /// Install the renderer used by [`log_graph`](Self::log_graph).
    pub fn set_graph_plotter(&mut self, plotter: impl GraphPlotter + 'static) {
        self.plotter = Some(Box::new(plotter));
    }

    pub fn log_scalar(&mut self, value: f64, name: &str, step: u64) -> Result<()> {
        self.recorder.record_scalar(name, value, step)
    }

    /// Log every entry of `values` into one plot tagged `"{group}_{phase}"`.
    pub fn log_scalars(
        &mut self,
        values: &HashMap<String, f64>,
        group: &str,
        step: u64,
        phase: &str,
    ) -> Result<()> {
        self.recorder
            .record_scalars(&phased(group, phase), values, step)
    }

    /// `image` must be `[C, H, W]`.
    pub fn log_image(&mut self, image: ArrayViewD<'_, u8>, name: &str, step: u64) -> Result<()> {
        media::check_rank("log_image", image.shape(), 3)?;
        let image = image.into_dimensionality::<Ix3>()?;
        self.recorder.record_image(name, image, step)
    }

    /// `frames` must be `[N, T, C, H, W]`.
    pub fn log_video(
        &mut self,
        frames: ArrayViewD<'_, u8>,
        name: &str,
        step: u64,
        fps: u32,
    ) -> Result<()> {
        media::check_rank("log_video", frames.shape(), 5)?;
        let frames = frames.into_dimensionality::<Ix5>()?;
        self.recorder.record_video(name, frames, step, fps)
    }

    /// Log the image observations of the first `max_videos` rollouts as one
    /// video batch, padding short rollouts with their last frame.
    pub fn log_paths_as_videos(
        &mut self,
        paths: &[Trajectory],
        step: u64,
        max_videos: usize,
        fps: u32,
        title: &str,
    ) -> Result<()> {
        let videos = media::stack_trajectories(paths, max_videos)?;
        self.log_video(videos.view().into_dyn(), title, step, fps)
    }

    pub fn log_figures(
        &mut self,
        figures: &[Figure],
        name: &str,
        step: u64,
        phase: &str,
    ) -> Result<()> {
        if figures.is_empty() {
            return Err(LoggerError::EmptyBatch("log_figures"));
        }
        self.recorder
            .record_figures(&phased(name, phase), figures, step)
    }

    pub fn log_figure(&mut self, figure: &Figure, name: &str, step: u64, phase: &str) -> Result<()> {
        self.recorder
            .record_figures(&phased(name, phase), std::slice::from_ref(figure), step)
    }

    /// Render `values` with the installed [`GraphPlotter`] and log the result
    /// as an image tagged `"{name}_{phase}"`.
    ///
    /// Fails with [`LoggerError::NoGraphPlotter`] until a plotter is set.
    pub fn log_graph(
        &mut self,
        values: ArrayView1<'_, f64>,
        name: &str,
        step: u64,
        phase: &str,
    ) -> Result<()> {
        let plotter = self.plotter.as_ref().ok_or(LoggerError::NoGraphPlotter)?;
        let figure = plotter.plot(values)?;
        let image = figure.to_chw();
        self.recorder
            .record_image(&phased(name, phase), image.view(), step)
    }

    /// Write every recorded scalar to `path`, or `<log_dir>/scalar_data.json`.
    pub fn dump_scalars(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.scalar_dump_path());
        self.recorder.export_json(&path)?;
        debug!(path = %path.display(), tags = self.recorder.scalars().len(), "scalars dumped");
        Ok(path)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.recorder.flush()
    }

    /// Flush and close the recorder. Later recording calls fail.
    pub fn close(&mut self) -> Result<()> {
        self.recorder.close()
    }
}

impl<R: SummaryRecorder> Drop for ExperimentLogger<R> {
    fn drop(&mut self) {
        // Best-effort close on drop
        if let Err(e) = self.close() {
            warn!("Failed to close summary recorder: {}", e);
        }
    }
}

fn phased(name: &str, phase: &str) -> String {
    format!("{name}_{phase}")
}
