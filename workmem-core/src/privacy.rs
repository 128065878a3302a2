//! Privacy sanitization for paths and shell commands
//!
//! Raw paths and commands never reach an activity stream. The adapters in
//! [`crate::logger`] pass them through a [`Sanitizer`] first.
//!
//! [`PrivacyFilter`] is the default sanitizer. It is driven by
//! [`PrivacyConfig`] and an optional JSON-with-comments filters file:
//!
//! ```jsonc
//! {
//!     // keyword groups; any hit redacts the whole path
//!     "sensitive_keywords": { "secrets": ["password", "token"] },
//!     "sensitive_path_patterns": ["*.pem", "*/.aws/*"],
//!     "command_patterns": {
//!         "with_subcommand": [{ "name": "git", "capture_args": 1 }],
//!         "name_only": [{ "name": "curl" }]
//!     }
//! }
//! ```
//!
//! If the filters file is configured but cannot be loaded, the filter drops
//! to strict mode: fallback keywords, basenames and bare command names.

use crate::config::{CommandCapture, PathMode, PrivacyConfig};
use crate::jsonc;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Keywords used when no filters file supplies its own.
const FALLBACK_KEYWORDS: &[&str] = &[
    "password",
    "secret",
    "key",
    "token",
    "api_key",
    ".ssh",
    "credentials",
];

/// Scrubs identifying detail from caller input before it becomes event context.
///
/// Implementations must not panic and must be deterministic for a given input.
pub trait Sanitizer: Send + Sync {
    /// Sanitize a filesystem path.
    fn sanitize_path(&self, raw: &str) -> String;

    /// Sanitize a shell command line.
    fn sanitize_command(&self, raw: &str) -> String;
}

// ============================================
// Filters file
// ============================================

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
struct Filters {
    sensitive_keywords: BTreeMap<String, Vec<String>>,
    sensitive_path_patterns: Vec<String>,
    command_patterns: CommandPatterns,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
struct CommandPatterns {
    with_subcommand: Vec<SubcommandPattern>,
    name_only: Vec<NamePattern>,
}

#[derive(Debug, Deserialize, Clone)]
struct SubcommandPattern {
    name: String,
    #[serde(default)]
    capture_args: usize,
}

#[derive(Debug, Deserialize, Clone)]
struct NamePattern {
    name: String,
}

impl Filters {
    fn fallback() -> Self {
        let mut sensitive_keywords = BTreeMap::new();
        sensitive_keywords.insert(
            "fallback".to_string(),
            FALLBACK_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        );
        Self {
            sensitive_keywords,
            ..Default::default()
        }
    }

    fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        jsonc::from_str(&content).map_err(|e| e.to_string())
    }
}

// ============================================
// PrivacyFilter
// ============================================

/// Config-driven [`Sanitizer`].
#[derive(Debug, Clone)]
pub struct PrivacyFilter {
    config: PrivacyConfig,
    filters: Filters,
    strict: bool,
    home: Option<PathBuf>,
}

impl PrivacyFilter {
    /// Build a filter from configuration, loading the filters file if one is set.
    pub fn from_config(config: &PrivacyConfig) -> Self {
        let filters = match &config.filters_file {
            None => Filters::fallback(),
            Some(path) => match Filters::load(path) {
                Ok(filters) => filters,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Privacy filters unavailable, using strict mode"
                    );
                    return Self::strict();
                }
            },
        };

        Self {
            config: config.clone(),
            filters,
            strict: false,
            home: home_prefix(),
        }
    }

    /// Maximum-privacy filter used when configuration cannot be trusted.
    pub fn strict() -> Self {
        let config = PrivacyConfig {
            enabled: true,
            case_sensitive: false,
            path_mode: PathMode::Basename,
            sanitize_home: true,
            command_capture: CommandCapture::NameOnly,
            capture_subcommands: false,
            max_args_capture: 0,
            glob_patterns: false,
            filters_file: None,
            ..Default::default()
        };
        Self {
            config,
            filters: Filters::fallback(),
            strict: true,
            home: home_prefix(),
        }
    }

    /// Override the home directory used for home-prefix replacement.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Whether the filter fell back to strict mode.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    fn contains_keyword(&self, path: &str) -> bool {
        let haystack = if self.config.case_sensitive {
            path.to_string()
        } else {
            path.to_lowercase()
        };

        self.filters
            .sensitive_keywords
            .values()
            .flatten()
            .filter(|keyword| !keyword.is_empty())
            .any(|keyword| {
                if self.config.case_sensitive {
                    haystack.contains(keyword.as_str())
                } else {
                    haystack.contains(&keyword.to_lowercase())
                }
            })
    }

    fn matches_path_pattern(&self, path: &str) -> bool {
        self.config.glob_patterns
            && self
                .filters
                .sensitive_path_patterns
                .iter()
                .map(|pattern| pattern.trim_matches('*'))
                .filter(|core| !core.is_empty())
                .any(|core| path.contains(core))
    }

    fn replace_home(&self, path: &str) -> String {
        if !self.config.sanitize_home {
            return path.to_string();
        }
        let Some(home) = self.home.as_deref().filter(|h| !h.as_os_str().is_empty()) else {
            return path.to_string();
        };
        match Path::new(path).strip_prefix(home) {
            Ok(rest) if rest.as_os_str().is_empty() => self.config.home_token.clone(),
            Ok(rest) => format!("{}/{}", self.config.home_token, rest.display()),
            Err(_) => path.to_string(),
        }
    }
}

impl Default for PrivacyFilter {
    fn default() -> Self {
        Self::from_config(&PrivacyConfig::default())
    }
}

impl Sanitizer for PrivacyFilter {
    fn sanitize_path(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }
        if !self.config.enabled {
            return raw.to_string();
        }

        if self.contains_keyword(raw) || self.matches_path_pattern(raw) {
            return self.config.redaction_label.clone();
        }

        let path = self.replace_home(raw);
        match self.config.path_mode {
            PathMode::Full => path,
            PathMode::Basename => basename(&path),
        }
    }

    fn sanitize_command(&self, raw: &str) -> String {
        if !self.config.enabled {
            return raw.to_string();
        }

        let parts: Vec<&str> = raw.split_whitespace().collect();
        let Some(&name) = parts.first() else {
            return String::new();
        };

        if self.strict {
            return name.to_string();
        }

        let patterns = &self.filters.command_patterns;
        if patterns.name_only.iter().any(|p| name.starts_with(&p.name)) {
            return name.to_string();
        }

        if self.config.capture_subcommands {
            if let Some(pattern) = patterns
                .with_subcommand
                .iter()
                .find(|p| name.starts_with(&p.name))
            {
                let count = pattern
                    .capture_args
                    .min(self.config.max_args_capture)
                    .min(parts.len() - 1);
                return parts[..=count].join(" ");
            }
        }

        match self.config.command_capture {
            CommandCapture::NameOnly => name.to_string(),
            CommandCapture::NameAndSubcommand => parts[..parts.len().min(2)].join(" "),
            CommandCapture::FullCommand => raw.to_string(),
        }
    }
}

/// Sanitizer that records input unchanged. Intended for tests and trusted callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Sanitizer for Passthrough {
    fn sanitize_path(&self, raw: &str) -> String {
        raw.to_string()
    }

    fn sanitize_command(&self, raw: &str) -> String {
        raw.to_string()
    }
}

fn home_prefix() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(config: PrivacyConfig) -> PrivacyFilter {
        PrivacyFilter::from_config(&config).with_home("/home/ada")
    }

    fn filters_file(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("filters.jsonc");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_path_reduced_to_basename() {
        let f = filter(PrivacyConfig::default());
        assert_eq!(f.sanitize_path("/home/ada/work/app/src/main.rs"), "main.rs");
        assert_eq!(f.sanitize_path(""), "");
    }

    #[test]
    fn test_sensitive_keyword_redacts() {
        let f = filter(PrivacyConfig::default());
        assert_eq!(f.sanitize_path("/home/ada/.ssh/id_ed25519"), "[PRIVATE]");
        assert_eq!(f.sanitize_path("/srv/PASSWORD.txt"), "[PRIVATE]");
    }

    #[test]
    fn test_full_mode_replaces_home() {
        let f = filter(PrivacyConfig {
            path_mode: PathMode::Full,
            ..Default::default()
        });
        assert_eq!(f.sanitize_path("/home/ada/work/lib.rs"), "~/work/lib.rs");
        assert_eq!(f.sanitize_path("/opt/tool/lib.rs"), "/opt/tool/lib.rs");
        assert_eq!(f.sanitize_path("/home/ada"), "~");
    }

    #[test]
    fn test_home_match_is_per_component() {
        let f = filter(PrivacyConfig {
            path_mode: PathMode::Full,
            ..Default::default()
        });
        assert_eq!(f.sanitize_path("/home/adam/x.rs"), "/home/adam/x.rs");
        assert_eq!(f.sanitize_path("/home/ada/x.rs"), "~/x.rs");
    }

    #[test]
    fn test_disabled_returns_input() {
        let f = filter(PrivacyConfig {
            enabled: false,
            ..Default::default()
        });
        assert_eq!(f.sanitize_path("/home/ada/secret.txt"), "/home/ada/secret.txt");
        assert_eq!(f.sanitize_command("curl -H token"), "curl -H token");
    }

    #[test]
    fn test_command_name_only_by_default() {
        let f = filter(PrivacyConfig::default());
        assert_eq!(f.sanitize_command("cargo test --release"), "cargo");
        assert_eq!(f.sanitize_command("   "), "");
    }

    #[test]
    fn test_command_name_and_subcommand() {
        let f = filter(PrivacyConfig {
            command_capture: CommandCapture::NameAndSubcommand,
            ..Default::default()
        });
        assert_eq!(f.sanitize_command("git push origin main"), "git push");
        assert_eq!(f.sanitize_command("ls"), "ls");
    }

    #[test]
    fn test_filters_file_patterns() {
        let (_dir, path) = filters_file(
            r#"
// project filters
{
    "sensitive_keywords": { "clients": ["acme"] },
    "sensitive_path_patterns": ["*.pem"],
    "command_patterns": {
        "with_subcommand": [{ "name": "git", "capture_args": 3 }],
        "name_only": [{ "name": "curl" }] // never capture URLs
    }
}
"#,
        );
        let f = filter(PrivacyConfig {
            filters_file: Some(path),
            capture_subcommands: true,
            max_args_capture: 2,
            glob_patterns: true,
            command_capture: CommandCapture::FullCommand,
            ..Default::default()
        });

        assert!(!f.is_strict());
        assert_eq!(f.sanitize_path("/work/Acme/report.md"), "[PRIVATE]");
        assert_eq!(f.sanitize_path("/etc/tls/server.pem"), "[PRIVATE]");
        assert_eq!(f.sanitize_path("/work/notes.md"), "notes.md");
        assert_eq!(f.sanitize_command("git commit -m wip now"), "git commit -m");
        assert_eq!(f.sanitize_command("git"), "git");
        assert_eq!(f.sanitize_command("curl https://x.test/?q=1"), "curl");
        assert_eq!(f.sanitize_command("make all"), "make all");
    }

    #[test]
    fn test_missing_filters_file_falls_back_to_strict() {
        let f = PrivacyFilter::from_config(&PrivacyConfig {
            filters_file: Some(PathBuf::from("/nonexistent/filters.jsonc")),
            command_capture: CommandCapture::FullCommand,
            ..Default::default()
        });
        assert!(f.is_strict());
        assert_eq!(f.sanitize_command("rm -rf build"), "rm");
        assert_eq!(f.sanitize_path("/x/api_key.txt"), "[PRIVATE]");
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(Passthrough.sanitize_path("/a/b"), "/a/b");
        assert_eq!(Passthrough.sanitize_command("ls -la"), "ls -la");
    }
}
