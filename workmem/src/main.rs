//! workmem - working-memory activity logger
//!
//! Called from session hooks to append activity events, and by hand to
//! inspect a session's stream.
//!
//! The hook commands (`log`, `tool`, `command`) always exit 0 and print
//! nothing: logging failures must never disturb the session being observed.
//! Failures are visible only in the tracing log and the diagnostic sink.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::SecondsFormat;
use clap::{Parser, Subcommand};
use workmem_core::session::validate_session_id;
use workmem_core::{read_stream, ActivityLogger, Config, StreamRecord, StreamSummary};

#[derive(Parser)]
#[command(name = "workmem")]
#[command(about = "Session-scoped working-memory activity logging")]
#[command(version)]
struct Args {
    /// Config file (default: ~/.config/workmem/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append an event of any type
    Log {
        /// Event type (interaction, realization, struggle, breakthrough, routine, ...)
        event_type: String,

        /// What was being done (recorded as given; sanitize before passing)
        #[arg(long, default_value = "")]
        context: String,

        /// Outcome tag
        #[arg(long, default_value = "success")]
        result: String,

        /// Duration in milliseconds
        #[arg(long, default_value_t = 0)]
        duration_ms: u64,
    },

    /// Record a tool invocation on a file
    Tool {
        tool_name: String,
        file_path: String,

        /// The tool call failed
        #[arg(long)]
        failed: bool,
    },

    /// Record a shell command
    Command {
        cmd: String,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        exit_code: i32,

        #[arg(long, default_value_t = 0)]
        duration_ms: u64,
    },

    /// Print the records of a session's stream
    Show {
        /// Session id (default: current session)
        #[arg(short, long)]
        session: Option<String>,

        /// Only the last N records
        #[arg(short, long)]
        last: Option<usize>,
    },

    /// Summarize a session's stream
    Summary {
        /// Session id (default: current session)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Show the resolved session identity and paths
    Whoami,
}

fn load_config(path: Option<&PathBuf>) -> Config {
    match path {
        Some(path) => Config::load_from(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid config, using defaults");
            Config::default()
        }),
        None => Config::load_or_default(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_ref());

    // Logging is best-effort too; a hook must not fail because the state dir is read-only.
    let _log_guard = workmem_core::logging::init(&config.logging).ok();

    let logger = ActivityLogger::new(config);

    match args.command {
        Command::Log {
            event_type,
            context,
            result,
            duration_ms,
        } => {
            let outcome = logger.log_activity(
                &event_type,
                &context,
                &result,
                Duration::from_millis(duration_ms),
            );
            report_ignored(outcome);
            Ok(())
        }
        Command::Tool {
            tool_name,
            file_path,
            failed,
        } => {
            report_ignored(logger.log_tool_use(&tool_name, &file_path, !failed));
            Ok(())
        }
        Command::Command {
            cmd,
            exit_code,
            duration_ms,
        } => {
            report_ignored(logger.log_command(
                &cmd,
                exit_code,
                Duration::from_millis(duration_ms),
            ));
            Ok(())
        }
        Command::Show { session, last } => cmd_show(&logger, session, last),
        Command::Summary { session } => cmd_summary(&logger, session),
        Command::Whoami => cmd_whoami(&logger),
    }
}

fn report_ignored(outcome: workmem_core::Result<()>) {
    if let Err(e) = outcome {
        tracing::warn!(error = %e, "Activity logging failed (ignored)");
    }
}

fn session_or_current(logger: &ActivityLogger, session: Option<String>) -> Result<String> {
    if let Some(session) = session {
        validate_session_id(&session)?;
        return Ok(session);
    }
    let identity = logger.identity();
    if identity.is_sentinel() {
        bail!("no active session; pass --session");
    }
    Ok(identity.session_id)
}

fn cmd_show(logger: &ActivityLogger, session: Option<String>, last: Option<usize>) -> Result<()> {
    let session_id = session_or_current(logger, session)?;
    let path = logger.stream_path(&session_id);
    let read = read_stream(&path)
        .with_context(|| format!("failed to read stream {}", path.display()))?;

    let skip = last
        .map(|n| read.records.len().saturating_sub(n))
        .unwrap_or(0);
    for record in &read.records[skip..] {
        println!("{}", format_record(record));
    }

    for warning in &read.warnings {
        eprintln!("warning: {}", warning);
    }

    Ok(())
}

fn format_record(record: &StreamRecord) -> String {
    let mut line = format!(
        "{}  {:<14} {:<8} {}",
        record.timestamp().format("%Y-%m-%d %H:%M:%S"),
        record.kind(),
        record.result().unwrap_or("-"),
        record.context().unwrap_or(""),
    );
    if let Some(ms) = record.duration_ms() {
        line.push_str(&format!(" ({}ms)", ms));
    }
    if record.is_legacy() {
        line.push_str(" [legacy]");
    }
    line.trim_end().to_string()
}

fn cmd_summary(logger: &ActivityLogger, session: Option<String>) -> Result<()> {
    let session_id = session_or_current(logger, session)?;
    let path = logger.stream_path(&session_id);
    let read = read_stream(&path)
        .with_context(|| format!("failed to read stream {}", path.display()))?;
    let summary = StreamSummary::from_records(&read.records);

    println!("Session:         {}", session_id);
    println!("Events:          {}", summary.total);
    println!("Legacy events:   {}", summary.legacy);
    println!("Skipped lines:   {}", read.warnings.len());
    if let (Some(first), Some(last)) = (summary.first, summary.last) {
        println!(
            "First:           {}",
            first.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        println!(
            "Last:            {}",
            last.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }
    match summary.success_rate() {
        Some(rate) => println!(
            "Success rate:    {:.0}% ({} ok, {} failed)",
            rate * 100.0,
            summary.successes,
            summary.failures
        ),
        None => println!("Success rate:    n/a"),
    }
    println!("Total duration:  {}ms", summary.total_duration_ms);

    if !summary.by_kind.is_empty() {
        println!();
        println!("By type:");
        for (kind, count) in &summary.by_kind {
            println!("  {:<16} {}", kind, count);
        }
    }

    Ok(())
}

fn cmd_whoami(logger: &ActivityLogger) -> Result<()> {
    let paths = logger.config().resolve_paths();
    let identity = logger.identity();

    let rendered = serde_json::to_string_pretty(&identity).context("failed to render identity")?;
    println!("{}", rendered);
    println!();
    println!("Descriptor:      {}", paths.descriptor_path.display());
    println!("Activity dir:    {}", paths.activity_dir.display());
    println!(
        "Log file:        {}",
        workmem_core::logging::log_file_path().display()
    );
    if identity.is_sentinel() {
        println!("Status:          no active session (events are skipped)");
    } else {
        println!(
            "Stream:          {}",
            logger.stream_path(&identity.session_id).display()
        );
    }

    Ok(())
}
