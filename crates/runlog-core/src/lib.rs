//! runlog-core: text logging and TensorBoard summaries for RL training runs.
//!
//! An [`ExperimentLogger`] owns one run directory. It keeps a leveled text
//! log in `log.log` and forwards scalars, images, videos and figures to a
//! [`SummaryRecorder`], by default TensorBoard event files.

pub mod config;
pub mod error;
pub mod logger;
pub mod media;
pub mod models;
pub mod plot;
pub mod recorder;
pub mod storage;
pub mod text;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use logger::{ExperimentLogger, DEFAULT_FPS, DEFAULT_MAX_VIDEOS, DEFAULT_VIDEO_TITLE};
pub use models::{Figure, Record, ScalarPoint, Trajectory};
pub use plot::{render_figure, GraphPlotter, LinePlotter};
pub use recorder::{MemoryRecorder, ScalarHistory, SummaryRecorder, TensorBoardRecorder};
pub use text::{LogLevel, TextLogger};

pub use ndarray;
