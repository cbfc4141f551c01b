//! Error types for runlog-core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("{what} expects a rank-{expected} array, got rank {actual}")]
    InvalidRank {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{0} requires a non-empty batch")]
    EmptyBatch(&'static str),

    #[error("Trajectory {0} has no frames")]
    EmptyTrajectory(usize),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Unsupported channel count {0} (expected 1, 3 or 4)")]
    UnsupportedChannels(usize),

    #[error("Plotting failed: {0}")]
    Plot(String),

    #[error("No graph plotter installed; call set_graph_plotter first")]
    NoGraphPlotter,

    #[error("Summary recorder is closed")]
    RecorderClosed,
}

pub type Result<T> = std::result::Result<T, LoggerError>;
