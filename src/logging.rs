use std::path::Path;

use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "chartday=info,query_log=info";

/// Install the global subscriber.
///
/// Always logs to stderr. With `log_dir` set, events are also appended to a
/// daily rolling file through a non-blocking writer; the returned guard
/// flushes it on drop. The file is best effort: if it can't be opened we
/// carry on with stderr only.
pub fn init(log_dir: Option<&Path>) -> Option<WorkerGuard> {
  let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

  let stderr_layer = fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(false)
    .with_filter(filter());

  let appender = log_dir.map(|dir| {
    RollingFileAppender::builder()
      .rotation(Rotation::DAILY)
      .filename_prefix("chartday")
      .filename_suffix("log")
      .build(dir)
  });

  let (file_layer, guard, file_error) = match appender {
    Some(Ok(appender)) => {
      let (writer, guard) = tracing_appender::non_blocking(appender);
      let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter());
      (Some(layer), Some(guard), None)
    }
    Some(Err(e)) => (None, None, Some(e)),
    None => (None, None, None),
  };

  tracing_subscriber::registry()
    .with(stderr_layer)
    .with(file_layer)
    .init();

  if let (Some(e), Some(dir)) = (file_error, log_dir) {
    warn!(dir = %dir.display(), error = %e, "File logging disabled");
  }

  guard
}
