//! Session identity resolution
//!
//! Every event is attributed to the session described by the descriptor file
//! the session-start hook writes (`current-log.json`). Identity is read fresh
//! on each call; nothing is cached between calls.
//!
//! A missing or malformed descriptor is a normal state (the session has not
//! been initialized yet), so resolution never fails. It yields
//! [`SessionIdentity::sentinel`] instead.
//!
//! The session id becomes a file name under the activity directory, so a
//! descriptor whose id is empty or is not a single plain path component is
//! treated as malformed.

use crate::diagnostics::{Diagnostic, DiagnosticSink, Stage};
use crate::error::Error;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Session id carried by the sentinel identity.
pub const UNKNOWN_SESSION: &str = "unknown";
/// Instance id carried by the sentinel identity.
pub const DEFAULT_INSTANCE_ID: &str = "nova_dawn";
/// User id carried by the sentinel identity.
pub const DEFAULT_USER_ID: &str = "seanje-lenox-wise";

/// Who and where an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub session_id: String,
    pub instance_id: String,
    pub user_id: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub project_id: Option<String>,
    /// Working directory or project path
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub work_context: Option<String>,
}

impl SessionIdentity {
    /// Placeholder identity for "no initialized session".
    pub fn sentinel() -> Self {
        Self {
            session_id: UNKNOWN_SESSION.to_string(),
            instance_id: DEFAULT_INSTANCE_ID.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            project_id: None,
            work_context: None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.session_id == UNKNOWN_SESSION
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Reads the session descriptor into a [`SessionIdentity`].
#[derive(Clone)]
pub struct SessionContextResolver {
    descriptor_path: PathBuf,
    sink: Arc<dyn DiagnosticSink>,
}

impl SessionContextResolver {
    pub fn new(descriptor_path: impl Into<PathBuf>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            descriptor_path: descriptor_path.into(),
            sink,
        }
    }

    pub fn descriptor_path(&self) -> &Path {
        &self.descriptor_path
    }

    /// Resolve the current identity. Never fails.
    pub fn resolve(&self) -> SessionIdentity {
        match read_descriptor(&self.descriptor_path) {
            Ok(identity) => identity,
            Err(error) => {
                tracing::debug!(
                    path = %self.descriptor_path.display(),
                    error = %error,
                    "Session descriptor unavailable, using sentinel identity"
                );
                self.sink.emit(
                    &Diagnostic::failure(Stage::Resolve, "session descriptor unavailable", error)
                        .with_path(&self.descriptor_path),
                );
                SessionIdentity::sentinel()
            }
        }
    }
}

impl std::fmt::Debug for SessionContextResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContextResolver")
            .field("descriptor_path", &self.descriptor_path)
            .finish_non_exhaustive()
    }
}

fn read_descriptor(path: &Path) -> crate::Result<SessionIdentity> {
    let data = std::fs::read(path)?;
    let identity: SessionIdentity = serde_json::from_slice(&data)?;
    validate_session_id(&identity.session_id)?;
    Ok(identity)
}

/// Check that a session id names exactly one file inside the activity directory.
///
/// Rejects empty ids, `.` and `..`, and anything containing a path separator
/// or NUL.
pub fn validate_session_id(session_id: &str) -> crate::Result<()> {
    let invalid = session_id.is_empty()
        || session_id == "."
        || session_id == ".."
        || session_id.contains(['/', '\\', '\0'])
        || Path::new(session_id).components().count() != 1;
    if invalid {
        return Err(Error::InvalidSessionId(session_id.to_string()));
    }
    Ok(())
}
