//! Diagnostic side-channel
//!
//! The logger reports what happened on each call to a [`DiagnosticSink`].
//! Sinks are strictly best-effort: they cannot return errors and must swallow
//! their own failures, so a broken sink never affects the caller.

use crate::config::{DiagnosticsConfig, SinkKind};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Scratch file for success notes.
pub const SUCCESS_LOG: &str = "activity-logger-success.log";
/// Scratch file for failure notes.
pub const ERROR_LOG: &str = "activity-logger-error.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Pipeline stage a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the session descriptor
    Resolve,
    /// Creating the activity directory
    CreateDir,
    /// Serializing the event
    Serialize,
    /// Opening or writing the stream file
    Write,
    /// Event appended
    Append,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Resolve => "resolve",
            Stage::CreateDir => "create_dir",
            Stage::Serialize => "serialize",
            Stage::Write => "write",
            Stage::Append => "append",
        }
    }
}

/// One structured diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub outcome: Outcome,
    pub stage: Stage,
    pub message: String,
    /// Path that was being read or written
    pub path: Option<PathBuf>,
    /// Underlying error text
    pub error: Option<String>,
}

impl Diagnostic {
    pub fn success(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Success,
            stage,
            message: message.into(),
            path: None,
            error: None,
        }
    }

    pub fn failure(stage: Stage, message: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            outcome: Outcome::Failure,
            stage,
            message: message.into(),
            path: None,
            error: Some(error.to_string()),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.outcome {
            Outcome::Success => "SUCCESS",
            Outcome::Failure => "FAILURE",
        };
        write!(f, "{} [{}] {}", tag, self.stage.as_str(), self.message)?;
        if let Some(path) = &self.path {
            write!(f, " path={}", path.display())?;
        }
        if let Some(error) = &self.error {
            write!(f, " error={}", error)?;
        }
        Ok(())
    }
}

/// Receiver of diagnostics. Must not panic.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: &Diagnostic);
}

/// Discards everything. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn emit(&self, _diagnostic: &Diagnostic) {}
}

/// Appends plain-text lines to fixed scratch files.
///
/// Successes and failures go to separate files so failures can be grepped
/// without noise.
#[derive(Debug, Clone)]
pub struct ScratchFileSink {
    dir: PathBuf,
}

impl ScratchFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File a diagnostic with this outcome lands in.
    pub fn file_for(&self, outcome: Outcome) -> PathBuf {
        match outcome {
            Outcome::Success => self.dir.join(SUCCESS_LOG),
            Outcome::Failure => self.dir.join(ERROR_LOG),
        }
    }
}

impl DiagnosticSink for ScratchFileSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        let line = format!(
            "{} {}\n",
            chrono::Utc::now().to_rfc3339(),
            diagnostic
        );
        let _ = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_for(diagnostic.outcome))
            .and_then(|mut f| f.write_all(line.as_bytes()));
    }
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, d: &Diagnostic) {
        let path = d.path.as_ref().map(|p| p.display().to_string());
        match d.outcome {
            Outcome::Success => tracing::debug!(
                stage = d.stage.as_str(),
                path = path.as_deref(),
                "{}",
                d.message
            ),
            Outcome::Failure => tracing::warn!(
                stage = d.stage.as_str(),
                path = path.as_deref(),
                error = d.error.as_deref(),
                "{}",
                d.message
            ),
        }
    }
}

/// Wraps a callback.
pub struct FnSink<F>(pub F);

impl<F> DiagnosticSink for FnSink<F>
where
    F: Fn(&Diagnostic) + Send + Sync,
{
    fn emit(&self, diagnostic: &Diagnostic) {
        (self.0)(diagnostic)
    }
}

/// Build the sink selected in configuration.
pub fn sink_from_config(config: &DiagnosticsConfig) -> Arc<dyn DiagnosticSink> {
    match config.sink {
        SinkKind::None => Arc::new(NoopSink),
        SinkKind::Scratch => Arc::new(ScratchFileSink::new(config.scratch_dir())),
        SinkKind::Tracing => Arc::new(TracingSink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_display_includes_path_and_error() {
        let d = Diagnostic::failure(Stage::Write, "open failed", "permission denied")
            .with_path("/data/s1.jsonl");
        assert_eq!(
            d.to_string(),
            "FAILURE [write] open failed path=/data/s1.jsonl error=permission denied"
        );
    }

    #[test]
    fn test_scratch_sink_separates_outcomes() {
        let dir = tempfile::TempDir::new().unwrap();
        let sink = ScratchFileSink::new(dir.path());

        sink.emit(&Diagnostic::success(Stage::Append, "interaction -> s1.jsonl"));
        sink.emit(&Diagnostic::failure(Stage::CreateDir, "mkdir failed", "read-only"));
        sink.emit(&Diagnostic::success(Stage::Append, "routine -> s1.jsonl"));

        let ok = std::fs::read_to_string(dir.path().join(SUCCESS_LOG)).unwrap();
        let err = std::fs::read_to_string(dir.path().join(ERROR_LOG)).unwrap();
        assert_eq!(ok.lines().count(), 2);
        assert!(ok.contains("routine -> s1.jsonl"));
        assert_eq!(err.lines().count(), 1);
        assert!(err.contains("read-only"));
    }

    #[test]
    fn test_scratch_sink_swallows_io_errors() {
        let sink = ScratchFileSink::new("/nonexistent/workmem/scratch");
        sink.emit(&Diagnostic::failure(Stage::Write, "boom", "nope"));
    }

    #[test]
    fn test_fn_sink_receives_diagnostics() {
        let seen = Mutex::new(Vec::new());
        let sink = FnSink(|d: &Diagnostic| seen.lock().unwrap().push(d.stage));
        sink.emit(&Diagnostic::success(Stage::Resolve, "ok"));
        assert_eq!(*seen.lock().unwrap(), vec![Stage::Resolve]);
    }
}
