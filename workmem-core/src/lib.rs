//! # workmem-core
//!
//! Core library for workmem - session-scoped working-memory activity logging.
//!
//! This library provides:
//! - Session identity resolution from the session descriptor
//! - Activity event schema (current and legacy) with open extensions
//! - Append-only JSONL stream writing and dual-schema reading
//! - Privacy sanitization of paths and commands
//! - Configuration management and logging infrastructure
//!
//! Activity logging is instrumentation: every call is safe to make with no
//! setup, and every returned error is safe to ignore.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! // Zero-setup entry points; errors never need handling.
//! let _ = workmem_core::log_tool_use("Edit", "/home/ada/src/main.rs", true);
//! let _ = workmem_core::log_command("cargo test", 0, Duration::from_millis(840));
//!
//! // Or with explicit configuration.
//! let logger = workmem_core::ActivityLogger::new(workmem_core::Config::default());
//! let _ = logger.log_activity("breakthrough", "parser", "success", Duration::ZERO);
//! ```

// Re-export commonly used items at the crate root
pub use config::{ActivityPaths, Config};
pub use error::{Error, Result};
pub use logger::{log_activity, log_command, log_tool_use, ActivityLogger};
pub use privacy::{PrivacyFilter, Sanitizer};
pub use session::{SessionContextResolver, SessionIdentity};
pub use stream::{read_stream, StreamRead, StreamSummary, StreamWriter};
pub use types::*;

// Public modules
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod jsonc;
pub mod logger;
pub mod logging;
pub mod privacy;
pub mod session;
pub mod stream;
pub mod types;
