//! Figure rendering on top of the plotters bitmap backend.

use ndarray::ArrayView1;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{LoggerError, Result};
use crate::models::Figure;

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for LoggerError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        LoggerError::Plot(err.to_string())
    }
}

/// Draw into a fresh `width` x `height` RGB canvas and return it as a [`Figure`].
pub fn render_figure<F>(width: u32, height: u32, draw: F) -> Result<Figure>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<()>,
{
    let mut rgb = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        draw(&root)?;
        root.present()?;
    }
    Figure::new(width, height, rgb)
}

/// Renders a 1-D series for [`ExperimentLogger::log_graph`](crate::ExperimentLogger::log_graph).
pub trait GraphPlotter {
    fn plot(&self, values: ArrayView1<'_, f64>) -> Result<Figure>;
}

impl<F> GraphPlotter for F
where
    F: Fn(ArrayView1<'_, f64>) -> Result<Figure>,
{
    fn plot(&self, values: ArrayView1<'_, f64>) -> Result<Figure> {
        self(values)
    }
}

/// Plots the series as a single line, index on x, value on y.
#[derive(Debug, Clone, Copy)]
pub struct LinePlotter {
    pub width: u32,
    pub height: u32,
    pub color: RGBColor,
}

impl Default for LinePlotter {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            color: BLUE,
        }
    }
}

impl GraphPlotter for LinePlotter {
    fn plot(&self, values: ArrayView1<'_, f64>) -> Result<Figure> {
        if values.is_empty() {
            return Err(LoggerError::EmptyBatch("log_graph"));
        }
        let (lo, hi) = value_range(values);
        let x_max = (values.len().max(2) - 1) as f64;

        render_figure(self.width, self.height, |root| {
            root.fill(&WHITE)?;
            let mut chart = ChartBuilder::on(root)
                .margin(10)
                .build_cartesian_2d(0f64..x_max, lo..hi)?;
            chart.draw_series(LineSeries::new(
                values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
                &self.color,
            ))?;
            Ok(())
        })
    }
}

fn value_range(values: ArrayView1<'_, f64>) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if lo < hi {
        (lo, hi)
    } else if lo.is_finite() {
        (lo - 1.0, lo + 1.0)
    } else {
        (-1.0, 1.0)
    }
}
