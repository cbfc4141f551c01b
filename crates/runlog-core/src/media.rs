//! Array reshaping for images, figure grids and rollout videos.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, Rgba, RgbaImage};
use ndarray::{s, Array3, Array5, ArrayView3, ArrayView5, Axis};

use crate::error::{LoggerError, Result};
use crate::models::Trajectory;
use crate::storage;

pub fn check_rank(what: &'static str, shape: &[usize], expected: usize) -> Result<()> {
    if shape.len() != expected {
        return Err(LoggerError::InvalidRank {
            what,
            expected,
            actual: shape.len(),
        });
    }
    Ok(())
}

/// Image encoders cannot represent a raster with no pixels.
pub fn check_raster(what: &str, height: usize, width: usize) -> Result<()> {
    if height == 0 || width == 0 {
        return Err(LoggerError::ShapeMismatch(format!(
            "{what} has an empty {height}x{width} raster"
        )));
    }
    Ok(())
}

/// Turn rollouts into one `[N, T, C, H, W]` video batch.
///
/// Only the first `min(max_videos, paths.len())` rollouts are used. Each is
/// transposed to `[T, C, H, W]`, and the shorter ones are padded by
/// repeating their last frame up to the longest length among them.
pub fn stack_trajectories(paths: &[Trajectory], max_videos: usize) -> Result<Array5<u8>> {
    let k = max_videos.min(paths.len());
    if k == 0 {
        return Err(LoggerError::EmptyBatch("log_paths_as_videos"));
    }
    let selected = &paths[..k];

    let frame_shape = selected[0].image_obs.shape()[1..].to_vec();
    for (i, path) in selected.iter().enumerate() {
        if path.is_empty() {
            return Err(LoggerError::EmptyTrajectory(i));
        }
        if path.image_obs.shape()[1..] != frame_shape[..] {
            return Err(LoggerError::ShapeMismatch(format!(
                "trajectory {i} has frames of shape {:?}, trajectory 0 has {:?}",
                &path.image_obs.shape()[1..],
                frame_shape
            )));
        }
    }

    let max_length = selected
        .iter()
        .map(Trajectory::len)
        .fold(selected[0].len(), usize::max);

    let (h, w, c) = (frame_shape[0], frame_shape[1], frame_shape[2]);
    let mut videos = Array5::<u8>::zeros((k, max_length, c, h, w));
    for (i, path) in selected.iter().enumerate() {
        let frames = path.image_obs.view().permuted_axes([0, 3, 1, 2]);
        let len = path.len();
        let mut slot = videos.index_axis_mut(Axis(0), i);
        slot.slice_mut(s![..len, .., .., ..]).assign(&frames);

        let last = frames.index_axis(Axis(0), len - 1);
        for t in len..max_length {
            slot.index_axis_mut(Axis(0), t).assign(&last);
        }
    }
    Ok(videos)
}

/// Convert a `[C, H, W]` image with 1, 3 or 4 channels into interleaved RGB.
pub fn chw_to_rgb(image: ArrayView3<u8>) -> Result<Vec<u8>> {
    let (c, h, w) = image.dim();
    if !matches!(c, 1 | 3 | 4) {
        return Err(LoggerError::UnsupportedChannels(c));
    }
    let mut rgb = Vec::with_capacity(h * w * 3);
    for y in 0..h {
        for x in 0..w {
            if c == 1 {
                let v = image[[0, y, x]];
                rgb.extend_from_slice(&[v, v, v]);
            } else {
                rgb.extend((0..3).map(|ch| image[[ch, y, x]]));
            }
        }
    }
    Ok(rgb)
}

/// Place `[C, H, W]` images side by side, top-aligned, on a black canvas.
pub fn tile_horizontal(images: &[ArrayView3<u8>]) -> Result<Array3<u8>> {
    let first = images.first().ok_or(LoggerError::EmptyBatch("image grid"))?;
    let channels = first.shape()[0];
    if let Some(bad) = images.iter().find(|im| im.shape()[0] != channels) {
        return Err(LoggerError::ShapeMismatch(format!(
            "grid mixes {} and {} channel images",
            channels,
            bad.shape()[0]
        )));
    }

    let height = images.iter().map(|im| im.shape()[1]).max().unwrap_or(0);
    let width: usize = images.iter().map(|im| im.shape()[2]).sum();
    let mut grid = Array3::<u8>::zeros((channels, height, width));
    let mut x0 = 0;
    for im in images {
        let (_, h, w) = im.dim();
        grid.slice_mut(s![.., ..h, x0..x0 + w]).assign(im);
        x0 += w;
    }
    Ok(grid)
}

/// Encode a `[N, T, C, H, W]` batch as one looping GIF, the N clips side by side.
pub fn write_gif(video: ArrayView5<u8>, fps: u32, path: &Path) -> Result<()> {
    let (n, t, _, h, w) = video.dim();
    if n == 0 || t == 0 {
        return Err(LoggerError::EmptyBatch("video"));
    }
    check_raster("video", h, w)?;
    storage::ensure_parent(path)?;

    let delay = Delay::from_numer_denom_ms(1000, fps.max(1));
    let mut frames = Vec::with_capacity(t);
    for step in 0..t {
        let clips: Vec<ArrayView3<u8>> = (0..n)
            .map(|i| video.slice(s![i, step, .., .., ..]))
            .collect();
        let grid = tile_horizontal(&clips)?;
        frames.push(Frame::from_parts(rgba_frame(grid.view())?, 0, 0, delay));
    }

    let mut encoder = GifEncoder::new(BufWriter::new(File::create(path)?));
    encoder.set_repeat(Repeat::Infinite)?;
    encoder.encode_frames(frames)?;
    Ok(())
}

fn rgba_frame(image: ArrayView3<u8>) -> Result<RgbaImage> {
    let (_, h, w) = image.dim();
    let rgb = chw_to_rgb(image)?;
    Ok(RgbaImage::from_fn(w as u32, h as u32, |x, y| {
        let i = (y as usize * w + x as usize) * 3;
        Rgba([rgb[i], rgb[i + 1], rgb[i + 2], 255])
    }))
}
