//! Logging initialization

use anyhow::{Context, Result};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::args::{Args, LogFormat};
use crate::settings::LoggingConfig;

/// Initialize logging from CLI flags, falling back to the settings file
///
/// `RUST_LOG` overrides the computed level. The returned guard flushes the
/// log file and must be held until exit.
pub fn init(args: &Args, settings: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => settings.level()?,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    let format = args.log_format.unwrap_or(settings.format);
    let log_file = args.log_file.as_deref().or(settings.file.as_deref());

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let (file_writer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_appender(path)?);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    // Console output goes to stderr so command output stays pipeable.
    let installed = match format {
        LogFormat::Text => {
            let console = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(args.verbose >= 2)
                .with_thread_names(args.verbose >= 2)
                .with_file(args.verbose >= 3)
                .with_line_number(args.verbose >= 3);
            let file = file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console)
                .with(file)
                .try_init()
        }
        LogFormat::Json => {
            let console = fmt::layer().json().with_writer(std::io::stderr);
            let file = file_writer.map(|w| fmt::layer().json().with_writer(w));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console)
                .with(file)
                .try_init()
        }
        LogFormat::Compact => {
            let console = fmt::layer().compact().with_writer(std::io::stderr);
            let file = file_writer.map(|w| fmt::layer().compact().with_ansi(false).with_writer(w));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console)
                .with(file)
                .try_init()
        }
    };
    installed.context("Failed to install log subscriber")?;

    Ok(guard)
}

fn open_appender(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    Ok(tracing_appender::rolling::never(dir, file_name))
}
