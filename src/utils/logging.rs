use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

/// File name prefix of the cli logs.
pub const CLI_PREFIX: &str = "cli";

/// Daily files kept in the logs directory.
const KEPT_LOG_FILES: usize = 7;

/// Level used when neither `--log` nor `RUST_LOG` says otherwise.
const DEFAULT_LEVEL: LevelFilter = LevelFilter::INFO;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingOptions {
    /// Also print the log to stderr and record everything down to trace.
    pub verbose: bool,
}

impl LoggingOptions {
    fn filter(&self) -> EnvFilter {
        let crate_name = env!("CARGO_PKG_NAME").replace('-', "_");
        if self.verbose {
            return EnvFilter::new(format!("{crate_name}={}", LevelFilter::TRACE));
        }
        let level = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LEVEL.to_string());
        EnvFilter::new(format!("{crate_name}={level}"))
    }
}

/// Sends the log into daily rotated files under `logs_path`. Answers and checklist output go to
/// stdout, so the console copy of the log uses stderr.
pub fn enable_logging(prefix: &str, logs_path: &Path, options: LoggingOptions) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(KEPT_LOG_FILES)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(logs_path)?;

    let verbose = options.verbose;
    let stderr = std::io::stderr.with_filter(move |_| verbose);

    tracing_subscriber::fmt()
        .with_env_filter(options.filter())
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false)
        .with_writer(stderr.and(appender))
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    // Several test binaries may install it.
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
});
