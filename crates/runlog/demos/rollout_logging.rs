//! Example of logging a short fake training run.

use std::collections::HashMap;

use anyhow::Result;
use ndarray::Array4;
use runlog::{ExperimentLogger, LinePlotter, Trajectory};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    // 1. Open the run directory
    let mut logger = ExperimentLogger::new("./runs/demo")?;
    logger.set_graph_plotter(LinePlotter::default());
    logger.text_logger().info("starting demo run");

    // 2. Scalars, one per step plus a grouped plot
    let mut returns = Vec::new();
    for step in 0..20u64 {
        let ret = (step as f64 * 0.3).sin() * 10.0;
        returns.push(ret);
        logger.log_scalar(ret, "eval_return", step)?;

        let losses = HashMap::from([
            ("actor".to_string(), 1.0 / (step + 1) as f64),
            ("critic".to_string(), 2.0 / (step + 1) as f64),
        ]);
        logger.log_scalars(&losses, "loss", step, "train")?;
    }

    // 3. Rollout videos: three fake rollouts of different lengths
    let paths: Vec<Trajectory> = [12usize, 8, 15]
        .iter()
        .map(|&len| {
            Trajectory::new(Array4::from_shape_fn((len, 32, 32, 3), |(t, y, x, c)| {
                ((t * 16 + y * 4 + x * 2 + c * 40) % 256) as u8
            }))
        })
        .collect();
    logger.log_paths_as_videos(&paths, 20, 2, 10, "eval_rollouts")?;

    // 4. The return curve as an image
    logger.log_graph(ndarray::Array1::from(returns).view(), "return_curve", 20, "eval")?;

    // 5. Persist
    logger.flush()?;
    let dump = logger.dump_scalars(None)?;
    logger.text_logger().info(&format!("scalars dumped to {}", dump.display()));
    logger.close()?;

    Ok(())
}
