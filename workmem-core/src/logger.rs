//! Activity logging pipeline
//!
//! [`ActivityLogger`] runs one linear pipeline per call:
//!
//! ```text
//! resolve paths → resolve identity → gate → build event → append line → diagnose
//! ```
//!
//! - **Gate**: with no initialized session (sentinel identity) the call is a
//!   successful no-op and nothing is written.
//! - Nothing is cached between calls; paths and identity are re-resolved each time.
//! - Errors are returned for the caller to ignore and mirrored to the
//!   diagnostic sink. Nothing is retried.
//!
//! The free functions [`log_activity`], [`log_tool_use`] and [`log_command`]
//! need no setup: they build a logger from the default configuration.

use crate::config::{ActivityPaths, Config};
use crate::diagnostics::{self, Diagnostic, DiagnosticSink, Stage};
use crate::error::{Error, Result};
use crate::privacy::{PrivacyFilter, Sanitizer};
use crate::session::{SessionContextResolver, SessionIdentity};
use crate::stream::StreamWriter;
use crate::types::{event_type, ActivityEvent, RESULT_FAILURE, RESULT_SUCCESS};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Writes activity events for the current session.
#[derive(Clone)]
pub struct ActivityLogger {
    config: Config,
    sanitizer: Arc<dyn Sanitizer>,
    sink: Arc<dyn DiagnosticSink>,
}

impl ActivityLogger {
    /// Logger using the sanitizer and diagnostic sink named in `config`.
    pub fn new(config: Config) -> Self {
        let sanitizer = Arc::new(PrivacyFilter::from_config(&config.privacy));
        let sink = diagnostics::sink_from_config(&config.diagnostics);
        Self {
            config,
            sanitizer,
            sink,
        }
    }

    /// Logger built from the default config file, or defaults if it is unusable.
    pub fn from_default_config() -> Self {
        Self::new(Config::load_or_default())
    }

    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the identity events would be attributed to right now.
    pub fn identity(&self) -> SessionIdentity {
        self.resolver(&self.config.resolve_paths()).resolve()
    }

    /// Stream file for a session under the current base directory.
    pub fn stream_path(&self, session_id: &str) -> PathBuf {
        StreamWriter::new(self.config.resolve_paths().activity_dir).stream_path(session_id)
    }

    fn resolver(&self, paths: &ActivityPaths) -> SessionContextResolver {
        SessionContextResolver::new(&paths.descriptor_path, Arc::clone(&self.sink))
    }

    /// Append one event to the current session's stream.
    ///
    /// Returns `Ok(())` without writing when no session is initialized.
    pub fn log_activity(
        &self,
        event_type: &str,
        context: &str,
        result: &str,
        duration: Duration,
    ) -> Result<()> {
        let paths = self.config.resolve_paths();
        let identity = self.resolver(&paths).resolve();

        if identity.is_sentinel() {
            tracing::debug!(event_type, "No active session, skipping activity event");
            return Ok(());
        }

        let writer = StreamWriter::new(&paths.activity_dir);
        let event = ActivityEvent::new(&identity, event_type, context, result, duration);

        match writer.append(&event) {
            Ok(path) => {
                tracing::debug!(
                    session_id = %identity.session_id,
                    event_type,
                    path = %path.display(),
                    "Activity event appended"
                );
                let message = format!("{} -> {}", event_type, path.display());
                self.sink
                    .emit(&Diagnostic::success(Stage::Append, message).with_path(path));
                Ok(())
            }
            Err(error) => {
                tracing::warn!(
                    session_id = %identity.session_id,
                    event_type,
                    error = %error,
                    "Failed to append activity event"
                );
                self.sink.emit(&failure_diagnostic(&error, &writer, &identity));
                Err(error)
            }
        }
    }

    /// Record a tool invocation on a file as an `interaction` event.
    pub fn log_tool_use(&self, tool_name: &str, file_path: &str, success: bool) -> Result<()> {
        let _span = tracing::debug_span!("tool_use", tool = tool_name).entered();
        let context = self.sanitizer.sanitize_path(file_path);
        self.log_activity(
            event_type::INTERACTION,
            &context,
            result_tag(success),
            Duration::ZERO,
        )
    }

    /// Record a shell command as a `routine` event.
    pub fn log_command(&self, cmd: &str, exit_code: i32, duration: Duration) -> Result<()> {
        let context = self.sanitizer.sanitize_command(cmd);
        self.log_activity(
            event_type::ROUTINE,
            &context,
            result_tag(exit_code == 0),
            duration,
        )
    }
}

impl std::fmt::Debug for ActivityLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLogger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn result_tag(success: bool) -> &'static str {
    if success {
        RESULT_SUCCESS
    } else {
        RESULT_FAILURE
    }
}

fn failure_diagnostic(
    error: &Error,
    writer: &StreamWriter,
    identity: &SessionIdentity,
) -> Diagnostic {
    match error {
        Error::DirectoryCreate { path, source } => {
            Diagnostic::failure(Stage::CreateDir, "activity dir create failed", source)
                .with_path(path)
        }
        Error::Write { path, source } => {
            Diagnostic::failure(Stage::Write, "stream write failed", source).with_path(path)
        }
        Error::Serialize(source) => {
            Diagnostic::failure(Stage::Serialize, "event serialize failed", source)
                .with_path(writer.stream_path(&identity.session_id))
        }
        other => Diagnostic::failure(Stage::Write, "append failed", other)
            .with_path(writer.stream_path(&identity.session_id)),
    }
}

/// [`ActivityLogger::log_activity`] with the default configuration.
pub fn log_activity(
    event_type: &str,
    context: &str,
    result: &str,
    duration: Duration,
) -> Result<()> {
    ActivityLogger::from_default_config().log_activity(event_type, context, result, duration)
}

/// [`ActivityLogger::log_tool_use`] with the default configuration.
pub fn log_tool_use(tool_name: &str, file_path: &str, success: bool) -> Result<()> {
    ActivityLogger::from_default_config().log_tool_use(tool_name, file_path, success)
}

/// [`ActivityLogger::log_command`] with the default configuration.
pub fn log_command(cmd: &str, exit_code: i32, duration: Duration) -> Result<()> {
    ActivityLogger::from_default_config().log_command(cmd, exit_code, duration)
}
