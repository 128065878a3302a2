//! Activity stream files
//!
//! One append-only JSON Lines file per session, `{activity_dir}/{session_id}.jsonl`.
//!
//! # Writing
//!
//! [`StreamWriter::append`] builds the complete line (JSON plus `\n`) in memory
//! before touching the file, then opens in append mode and issues one write.
//! A failure before the write leaves the file untouched; the file is never
//! held open between calls.
//!
//! Concurrent writers, threads or processes, are not coordinated. Line
//! integrity relies on the OS appending each small write atomically.
//!
//! # Reading
//!
//! [`read_stream`] accepts both schemas in the same file. Unparseable lines are
//! recorded in [`StreamRead::warnings`] and skipped rather than failing the read.

use crate::error::{Error, Result};
use crate::session::validate_session_id;
use crate::types::{ActivityEvent, StreamRecord, RESULT_FAILURE, RESULT_SUCCESS};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Appends events to per-session stream files.
#[derive(Debug, Clone)]
pub struct StreamWriter {
    activity_dir: PathBuf,
}

impl StreamWriter {
    pub fn new(activity_dir: impl Into<PathBuf>) -> Self {
        Self {
            activity_dir: activity_dir.into(),
        }
    }

    pub fn activity_dir(&self) -> &Path {
        &self.activity_dir
    }

    /// Stream file for a session.
    pub fn stream_path(&self, session_id: &str) -> PathBuf {
        self.activity_dir.join(format!("{}.jsonl", session_id))
    }

    /// Create the activity directory if it does not exist.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.activity_dir).map_err(|source| Error::DirectoryCreate {
            path: self.activity_dir.clone(),
            source,
        })
    }

    /// Append one event as one line. Returns the file written to.
    ///
    /// The event's session id must name a file inside the activity directory.
    pub fn append(&self, event: &ActivityEvent) -> Result<PathBuf> {
        validate_session_id(&event.session_id)?;
        self.ensure_dir()?;
        let line = event.to_line()?;
        let path = self.stream_path(&event.session_id);
        write_line(&path, &line).map_err(|source| Error::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

fn write_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())
}

/// Records read from a stream, with per-line problems.
#[derive(Debug, Default)]
pub struct StreamRead {
    pub records: Vec<StreamRecord>,
    /// `line N: reason` for each skipped line
    pub warnings: Vec<String>,
}

/// Read every record in a stream file, in file order.
///
/// Only I/O failures are errors; bad lines, including lines that are not
/// valid UTF-8, become warnings.
pub fn read_stream(path: &Path) -> Result<StreamRead> {
    let reader = BufReader::new(File::open(path)?);
    let mut read = StreamRead::default();

    for (idx, raw) in reader.split(b'\n').enumerate() {
        let raw = raw?;
        let parsed = String::from_utf8(raw)
            .map_err(|e| e.to_string())
            .and_then(|line| match line.trim() {
                "" => Ok(None),
                trimmed => StreamRecord::parse_line(trimmed)
                    .map(Some)
                    .map_err(|e| e.to_string()),
            });

        match parsed {
            Ok(Some(record)) => read.records.push(record),
            Ok(None) => {}
            Err(reason) => {
                tracing::warn!(
                    path = %path.display(),
                    line = idx + 1,
                    error = %reason,
                    "Skipping stream line"
                );
                read.warnings.push(format!("line {}: {}", idx + 1, reason));
            }
        }
    }

    Ok(read)
}

/// Aggregate view of a stream, across both schemas.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StreamSummary {
    pub total: usize,
    pub legacy: usize,
    /// Count per `event_type` (current) or `tool` (legacy)
    pub by_kind: BTreeMap<String, usize>,
    pub successes: usize,
    pub failures: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
    pub total_duration_ms: u64,
}

impl StreamSummary {
    pub fn from_records(records: &[StreamRecord]) -> Self {
        let mut summary = StreamSummary::default();

        for record in records {
            summary.total += 1;
            if record.is_legacy() {
                summary.legacy += 1;
            }
            *summary.by_kind.entry(record.kind().to_string()).or_default() += 1;

            match record.result() {
                Some(RESULT_SUCCESS) => summary.successes += 1,
                Some(RESULT_FAILURE) => summary.failures += 1,
                _ => {}
            }

            let ts = record.timestamp();
            summary.first = Some(summary.first.map_or(ts, |f| f.min(ts)));
            summary.last = Some(summary.last.map_or(ts, |l| l.max(ts)));
            summary.total_duration_ms = summary
                .total_duration_ms
                .saturating_add(record.duration_ms().unwrap_or(0));
        }

        summary
    }

    /// Share of success among records tagged success or failure.
    pub fn success_rate(&self) -> Option<f64> {
        let decided = self.successes + self.failures;
        (decided > 0).then(|| self.successes as f64 / decided as f64)
    }
}
