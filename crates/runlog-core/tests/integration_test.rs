//! Integration tests for runlog-core against the TensorBoard recorder.

use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array, Array4, IxDyn};
use runlog_core::{
    ExperimentLogger, Figure, LinePlotter, LoggerConfig, LoggerError, ScalarHistory,
    SummaryRecorder, TensorBoardRecorder, Trajectory,
};
use tempfile::TempDir;

fn make_logger(tmp: &TempDir) -> ExperimentLogger {
    ExperimentLogger::new(tmp.path()).expect("Failed to create ExperimentLogger")
}

fn read_log(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("log.log"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_logger_creates_run_files() {
    let tmp = TempDir::new().unwrap();
    let run_dir = tmp.path().join("nested").join("run");
    let logger = ExperimentLogger::new(&run_dir).unwrap();

    assert!(run_dir.join("log.log").exists(), "log.log should exist");
    assert_eq!(logger.log_dir(), run_dir.as_path());
    let lines = read_log(&run_dir);
    assert_eq!(lines[1], format!("logging outputs to {}", run_dir.display()));
}

#[test]
fn test_text_log_levels() {
    let tmp = TempDir::new().unwrap();
    let logger = make_logger(&tmp);

    logger.text_logger().debug("episode 3 done");
    logger.text_logger().error("nan in loss");

    let lines = read_log(tmp.path());
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[3], "episode 3 done");
    assert!(lines[4].contains(" - ERROR - nan in loss"));
    assert!(lines[4].starts_with("20"), "timestamp expected: {}", lines[4]);
}

#[test]
fn test_dump_scalars_default_path() {
    let tmp = TempDir::new().unwrap();
    let mut logger = make_logger(&tmp);

    for step in 0..5u64 {
        logger.log_scalar(step as f64 * 0.5, "eval_return", step).unwrap();
    }
    let values = HashMap::from([("actor".to_string(), 0.1), ("critic".to_string(), 0.2)]);
    logger.log_scalars(&values, "loss", 4, "train").unwrap();

    let path = logger.dump_scalars(None).unwrap();
    assert_eq!(path, tmp.path().join("scalar_data.json"));

    let history = ScalarHistory::load_json(&path).unwrap();
    let tags: Vec<&str> = history.tags().collect();
    assert_eq!(tags, vec!["eval_return", "loss_train/actor", "loss_train/critic"]);
    assert_eq!(history.get("eval_return").unwrap().len(), 5);
    assert_eq!(history.get("eval_return").unwrap()[4].value(), 2.0);
}

#[test]
fn test_dump_scalars_explicit_path() {
    let tmp = TempDir::new().unwrap();
    let mut logger = make_logger(&tmp);
    logger.log_scalar(1.0, "x", 0).unwrap();

    let target = tmp.path().join("exports").join("x.json");
    logger.dump_scalars(Some(&target)).unwrap();
    assert!(target.exists());
    assert!(!tmp.path().join("scalar_data.json").exists());
}

/// Bytes in event files under `dir` that a flush has already sealed.
fn sealed_event_bytes(dir: &Path) -> u64 {
    let mut total = 0;
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if path.is_dir() {
            total += sealed_event_bytes(&path);
        } else if name.contains("tfevents") && !name.ends_with(".0") {
            total += std::fs::metadata(&path).unwrap().len();
        }
    }
    total
}

#[test]
fn test_flush_persists_event_file() {
    let tmp = TempDir::new().unwrap();
    let config = LoggerConfig::new(tmp.path()).with_max_queue(10_000).with_flush_secs(3600);
    let mut logger = ExperimentLogger::with_config(config).unwrap();

    for step in 0..200u64 {
        logger.log_scalar(step as f64, "loss", step).unwrap();
    }
    logger
        .log_image(Array::<u8, _>::zeros(IxDyn(&[3, 8, 8])).view(), "obs", 0)
        .unwrap();
    logger.flush().unwrap();

    // Everything written before the flush is on disk now, not just the header.
    let after_flush = sealed_event_bytes(tmp.path());
    assert!(after_flush > 200 * 20, "only {after_flush} bytes after flush");

    logger.close().unwrap();
    assert_eq!(sealed_event_bytes(tmp.path()), after_flush);
}

#[test]
fn test_zero_sized_image_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let mut logger = make_logger(&tmp);

    let empty = Array::<u8, _>::zeros(IxDyn(&[3, 4, 0]));
    assert!(matches!(
        logger.log_image(empty.view(), "obs", 0),
        Err(LoggerError::ShapeMismatch(_))
    ));
    logger.log_scalar(1.0, "loss", 0).unwrap();
}

#[test]
fn test_paths_as_videos_writes_gif() {
    let tmp = TempDir::new().unwrap();
    let mut logger = make_logger(&tmp);

    let paths: Vec<Trajectory> = [4usize, 2, 5]
        .iter()
        .map(|&len| Trajectory::new(Array4::from_elem((len, 8, 8, 3), 100u8)))
        .collect();
    logger.log_paths_as_videos(&paths, 1, 2, 10, "rollouts").unwrap();

    let gif = logger.recorder().video_path("rollouts", 1);
    assert!(gif.exists());
}

#[test]
fn test_figures_and_graph() {
    let tmp = TempDir::new().unwrap();
    let mut logger = make_logger(&tmp);

    let figs = vec![Figure::blank(16, 12, [255, 0, 0]), Figure::blank(8, 12, [0, 0, 255])];
    logger.log_figures(&figs, "hist", 0, "eval").unwrap();
    logger.log_figure(&figs[0], "hist", 1, "eval").unwrap();
    assert!(matches!(
        logger.log_figures(&[], "hist", 2, "eval"),
        Err(LoggerError::EmptyBatch(_))
    ));

    let curve = ndarray::array![0.0, 1.0, 4.0, 9.0];
    assert!(matches!(
        logger.log_graph(curve.view(), "curve", 0, "eval"),
        Err(LoggerError::NoGraphPlotter)
    ));
    logger.set_graph_plotter(LinePlotter {
        width: 80,
        height: 60,
        ..Default::default()
    });
    logger.log_graph(curve.view(), "curve", 0, "eval").unwrap();
}

#[test]
fn test_close_then_write_fails() {
    let tmp = TempDir::new().unwrap();
    let mut logger = make_logger(&tmp);
    logger.close().unwrap();

    assert!(logger.recorder().is_closed());
    assert!(matches!(
        logger.log_scalar(1.0, "loss", 0),
        Err(LoggerError::RecorderClosed)
    ));
    let clip = Array::<u8, _>::zeros(IxDyn(&[1, 2, 3, 4, 4]));
    assert!(matches!(
        logger.log_video(clip.view(), "clip", 0, 10),
        Err(LoggerError::RecorderClosed)
    ));
}

#[test]
fn test_recorder_from_config() {
    let tmp = TempDir::new().unwrap();
    let config = LoggerConfig::new(tmp.path().join("tb")).with_max_queue(4);
    let recorder = TensorBoardRecorder::from_config(&config).unwrap();
    assert_eq!(recorder.log_dir(), tmp.path().join("tb").as_path());
    assert!(!recorder.is_closed());
}
