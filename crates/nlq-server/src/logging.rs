//! Structured logging for the nlq server
//!
//! Console output for development, JSON for production, and an optional
//! daily-rotated file in the configured log directory. Library crates only
//! emit `tracing` events; the subscriber is installed here once at startup.

use crate::config::LoggingConfig;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_NAME: &str = "nlq-server.log";

/// Directives appended to every filter
const QUIET_DIRECTIVES: &[&str] = &[
    "nlq_server=debug",
    "hyper=warn",
    "tokio=warn",
    "runtime=warn",
    "tower=warn",
    "h2=warn",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl LogFormat {
    /// Unknown values fall back to pretty
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    File,
    Both,
}

impl LogOutput {
    /// Unknown values fall back to stdout
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "file" => LogOutput::File,
            "both" => LogOutput::Both,
            _ => LogOutput::Stdout,
        }
    }
}

fn env_filter(level: &str) -> EnvFilter {
    let mut filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in QUIET_DIRECTIVES {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }
    filter
}

fn file_appender(config: &LoggingConfig) -> RollingFileAppender {
    if let Err(e) = std::fs::create_dir_all(&config.directory) {
        eprintln!(
            "cannot create log directory {}: {}",
            config.directory.display(),
            e
        );
    }
    RollingFileAppender::new(Rotation::DAILY, &config.directory, LOG_FILE_NAME)
}

/// Install the global subscriber.
///
/// ```bash
/// # Development: pretty console output at debug level
/// RUST_LOG=debug LOG_FORMAT=pretty nlq-server
///
/// # Production: JSON to stdout and file
/// RUST_LOG=info LOG_FORMAT=json LOG_OUTPUT=both LOG_DIR=/var/log/nlq nlq-server
/// ```
pub fn init(config: &LoggingConfig) {
    let format = LogFormat::parse(&config.format);
    let output = LogOutput::parse(&config.output);

    let stdout_layer = match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_thread_ids(true)
            .with_target(true)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    let registry = tracing_subscriber::registry().with(env_filter(&config.level));

    match output {
        LogOutput::Stdout => registry.with(stdout_layer).init(),
        LogOutput::File => {
            let file_layer = fmt::layer()
                .with_writer(file_appender(config))
                .with_ansi(false);
            registry.with(file_layer).init();
        }
        LogOutput::Both => {
            let file_layer = fmt::layer()
                .with_writer(file_appender(config))
                .with_ansi(false);
            registry.with(stdout_layer).with(file_layer).init();
        }
    }

    tracing::info!(
        format = ?format,
        output = ?output,
        level = %config.level,
        "Logging initialized"
    );
    if output != LogOutput::Stdout {
        tracing::debug!(directory = %config.directory.display(), "Log file directory");
    }
}

/// Emit one structured event with arbitrary `key: value` fields
///
/// ```rust,ignore
/// log_event!(
///     level: tracing::Level::INFO,
///     event: "question_answered",
///     request_id: id,
///     elapsed_ms: 42
/// );
/// ```
#[macro_export]
macro_rules! log_event {
    (level: $level:expr, event: $event:expr $(, $key:ident: $value:expr)* $(,)?) => {
        tracing::event!(
            $level,
            event = $event
            $(, $key = ?$value)*
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("COMPACT"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("fancy"), LogFormat::Pretty);
    }

    #[test]
    fn test_log_output_parse() {
        assert_eq!(LogOutput::parse("file"), LogOutput::File);
        assert_eq!(LogOutput::parse("both"), LogOutput::Both);
        assert_eq!(LogOutput::parse("stdout"), LogOutput::Stdout);
        assert_eq!(LogOutput::parse(""), LogOutput::Stdout);
    }
}
