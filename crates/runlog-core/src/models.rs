//! Data models for runlog.

use std::collections::HashMap;

use ndarray::{Array3, Array4, Array5};
use serde::{Deserialize, Serialize};

use crate::error::{LoggerError, Result};

/// A single rollout whose image observations should be rendered as a video.
#[derive(Debug, Clone)]
pub struct Trajectory {
    /// Rendered frames, `[time, height, width, channel]`
    pub image_obs: Array4<u8>,
}

impl Trajectory {
    pub fn new(image_obs: Array4<u8>) -> Self {
        Self { image_obs }
    }

    /// Number of frames in the rollout.
    pub fn len(&self) -> usize {
        self.image_obs.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A rendered plot: an RGB raster, row-major, 3 bytes per pixel.
///
/// The buffer always holds exactly `width * height * 3` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Figure {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl Figure {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(LoggerError::ShapeMismatch(format!(
                "{width}x{height} figure needs {expected} RGB bytes, got {}",
                rgb.len()
            )));
        }
        Ok(Self { width, height, rgb })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    /// A figure filled with a single colour.
    pub fn blank(width: u32, height: u32, fill: [u8; 3]) -> Self {
        let rgb = fill
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self { width, height, rgb }
    }

    /// The figure as a channel-first `[3, height, width]` image.
    pub fn to_chw(&self) -> Array3<u8> {
        let (h, w) = (self.height as usize, self.width as usize);
        Array3::from_shape_fn((3, h, w), |(c, y, x)| self.rgb[(y * w + x) * 3 + c])
    }
}

/// One sample of an exported scalar series: `[walltime, step, value]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarPoint(
    /// Seconds since the Unix epoch
    pub f64,
    pub u64,
    pub f64,
);

impl ScalarPoint {
    pub fn walltime(&self) -> f64 {
        self.0
    }

    pub fn step(&self) -> u64 {
        self.1
    }

    pub fn value(&self) -> f64 {
        self.2
    }
}

/// Everything a summary recorder can be asked to store.
#[derive(Debug, Clone)]
pub enum Record {
    Scalar {
        tag: String,
        value: f64,
        step: u64,
    },
    Scalars {
        main_tag: String,
        values: HashMap<String, f64>,
        step: u64,
    },
    /// `[C, H, W]`
    Image {
        tag: String,
        image: Array3<u8>,
        step: u64,
    },
    /// `[N, T, C, H, W]`
    Video {
        tag: String,
        frames: Array5<u8>,
        step: u64,
        fps: u32,
    },
    Figures {
        tag: String,
        figures: Vec<Figure>,
        step: u64,
    },
}

impl Record {
    pub fn tag(&self) -> &str {
        match self {
            Record::Scalar { tag, .. }
            | Record::Image { tag, .. }
            | Record::Video { tag, .. }
            | Record::Figures { tag, .. } => tag,
            Record::Scalars { main_tag, .. } => main_tag,
        }
    }

    pub fn step(&self) -> u64 {
        match self {
            Record::Scalar { step, .. }
            | Record::Scalars { step, .. }
            | Record::Image { step, .. }
            | Record::Video { step, .. }
            | Record::Figures { step, .. } => *step,
        }
    }
}
