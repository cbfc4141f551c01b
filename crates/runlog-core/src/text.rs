//! File-backed text log with level-dependent line formats.
//!
//! Each [`TextLogger`] owns its own `tracing` dispatcher writing to a single
//! file. Records are emitted with that dispatcher scoped as the default, so
//! nothing is routed through (or installed into) the process-global
//! subscriber and two loggers never see each other's lines.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::field::{Field, Visit};
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::error::Result;
use crate::storage;

/// `asctime` layout used for timestamped lines.
const ASCTIME: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Event field marking an ERROR-level event as CRITICAL.
const CRITICAL_FIELD: &str = "critical";

const TARGET: &str = "runlog::text";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Render one log line (without the trailing newline).
    pub fn render(self, asctime: &str, message: &str) -> String {
        match self {
            LogLevel::Debug => message.to_string(),
            LogLevel::Info | LogLevel::Warning | LogLevel::Error | LogLevel::Critical => {
                format!("{asctime} - {} - {message}", self.name())
            }
        }
    }

    fn from_event(level: &Level, critical: bool) -> Self {
        if *level == Level::ERROR {
            if critical {
                LogLevel::Critical
            } else {
                LogLevel::Error
            }
        } else if *level == Level::WARN {
            LogLevel::Warning
        } else if *level == Level::INFO {
            LogLevel::Info
        } else {
            LogLevel::Debug
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A leveled logger writing to one file at DEBUG threshold.
#[derive(Debug)]
pub struct TextLogger {
    path: PathBuf,
    dispatch: Dispatch,
}

impl TextLogger {
    /// Create (or truncate) the file at `path` and attach a logger to it.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        storage::ensure_parent(&path)?;
        let file = File::create(&path)?;

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .event_format(LevelFormat)
            .finish();

        Ok(Self {
            path,
            dispatch: Dispatch::new(subscriber),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        tracing::dispatcher::with_default(&self.dispatch, || match level {
            LogLevel::Debug => tracing::debug!(target: TARGET, "{message}"),
            LogLevel::Info => tracing::info!(target: TARGET, "{message}"),
            LogLevel::Warning => tracing::warn!(target: TARGET, "{message}"),
            LogLevel::Error => tracing::error!(target: TARGET, "{message}"),
            LogLevel::Critical => tracing::error!(target: TARGET, critical = true, "{message}"),
        });
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn critical(&self, message: &str) {
        self.log(LogLevel::Critical, message);
    }
}

// ─── Event formatting ────────────────────────────────────────────────────────

struct LevelFormat;

impl<S, N> FormatEvent<S, N> for LevelFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = LineFields::default();
        event.record(&mut fields);

        let level = LogLevel::from_event(event.metadata().level(), fields.critical);
        let asctime = Local::now().format(ASCTIME).to_string();
        writeln!(writer, "{}", level.render(&asctime, &fields.message))
    }
}

#[derive(Default)]
struct LineFields {
    message: String,
    critical: bool,
}

impl Visit for LineFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == CRITICAL_FIELD {
            self.critical = value;
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}
