use anyhow::{Context, Result, anyhow};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogConfig, LogFormat};

pub type BoxSubscriber = Box<dyn Subscriber + Send + Sync + 'static>;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `log.level`. When `log.directory` is set,
/// output goes to a daily rolling file and the returned guard must be held
/// until shutdown so buffered lines are flushed.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let (subscriber, guard) = build(config)?;
    subscriber
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {e}"))?;
    Ok(guard)
}

/// Build the subscriber described by `config` without installing it
pub fn build(config: &LogConfig) -> Result<(BoxSubscriber, Option<WorkerGuard>)> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level: {}", config.level))?;

    let (writer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::rfc_3339())
        .with_ansi(config.directory.is_none())
        .with_writer(writer);

    let subscriber: BoxSubscriber = match config.format {
        LogFormat::Json => Box::new(builder.json().finish()),
        LogFormat::Pretty => Box::new(builder.pretty().finish()),
    };

    Ok((subscriber, guard))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tracing::error;

    use super::*;

    fn config_in(dir: &Path, format: LogFormat) -> LogConfig {
        LogConfig {
            format,
            directory: Some(dir.to_string_lossy().into_owned()),
            ..LogConfig::default()
        }
    }

    /// Emit one event through a freshly built subscriber and return what reached the file
    fn capture(format: LogFormat, message: &'static str) -> String {
        let dir = tempfile::tempdir().unwrap();
        let (subscriber, guard) = build(&config_in(dir.path(), format)).unwrap();

        tracing::subscriber::with_default(subscriber, || error!("{}", message));
        drop(guard);

        let entry = fs::read_dir(dir.path())
            .unwrap()
            .next()
            .expect("log file written")
            .unwrap();
        fs::read_to_string(entry.path()).unwrap()
    }

    #[test]
    fn test_pretty_output_is_multi_line_with_location() {
        let output = capture(LogFormat::Pretty, "pretty line");
        assert!(output.contains("pretty line"));
        assert!(output.contains("logging.rs:"));
        assert!(output.lines().count() > 1);
        assert!(!output.contains('\u{1b}'));
    }

    #[test]
    fn test_json_output_is_one_object_per_line() {
        let output = capture(LogFormat::Json, "json line");
        let first = output.lines().next().unwrap();
        let event: serde_json::Value = serde_json::from_str(first).unwrap();
        assert_eq!(event["fields"]["message"], "json line");
        assert_eq!(event["level"], "ERROR");
    }

    #[test]
    fn test_bad_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LogConfig {
            level: "datastore=loud".to_string(),
            ..LogConfig::default()
        };
        assert!(build(&config).is_err());
    }
}
