use std::str::FromStr;

use thiserror::Error;
use tracing::{Subscriber, level_filters::LevelFilter};
use tracing_subscriber::{
    EnvFilter, Layer, fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
};

/// Logging format to use
#[derive(Debug, Default)]
pub enum LoggingFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Error)]
#[error("unknown logging format: {0}")]
pub struct UnknownLoggingFormat(String);

impl FromStr for LoggingFormat {
    type Err = UnknownLoggingFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(LoggingFormat::Text),
            "json" => Ok(LoggingFormat::Json),
            value => Err(UnknownLoggingFormat(value.to_string())),
        }
    }
}

impl LoggingFormat {
    pub fn from_env() -> Result<LoggingFormat, UnknownLoggingFormat> {
        let format = match std::env::var("LOADFAVICON_LOGGING_FORMAT") {
            Ok(value) => value,
            Err(_) => return Ok(LoggingFormat::default()),
        };

        format.parse()
    }
}

/// Install the global subscriber, `level` is used unless `RUST_LOG` is set
pub fn init_logging(format: LoggingFormat, level: LevelFilter) {
    tracing_subscriber::registry()
        .with(filter_layer(level))
        .with(fmt_layer(format))
        .init();
}

/// Create a formatting layer from the provided format
pub fn fmt_layer<S>(format: LoggingFormat) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LoggingFormat::Text => text_fmt_layer().boxed(),
        LoggingFormat::Json => json_fmt_layer().boxed(),
    }
}

/// Layer the outputs content using a text based formatting, logs go to
/// stderr leaving stdout for the command output
pub fn text_fmt_layer<S>()
-> fmt::Layer<S, fmt::format::DefaultFields, fmt::format::Format, fn() -> std::io::Stderr> {
    fmt::layer()
        .with_writer(std::io::stderr as fn() -> std::io::Stderr)
        // Don't display the event's target (module path)
        .with_target(false)
}

/// Layer that outputs content using a JSON formatting
pub fn json_fmt_layer<S>() -> fmt::Layer<
    S,
    fmt::format::JsonFields,
    fmt::format::Format<fmt::format::Json>,
    fn() -> std::io::Stderr,
> {
    fmt::layer::<S>()
        .json()
        .with_writer(std::io::stderr as fn() -> std::io::Stderr)
        // Display source code file paths
        .with_file(true)
        // Display source code line numbers
        .with_line_number(true)
        // Don't display the event's target (module path)
        .with_target(false)
}

pub fn filter_layer(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
        // Increase logging requirements for noisy dependencies
        .add_directive("hyper_util=info".parse().expect("directive was invalid"))
        .add_directive("h2=info".parse().expect("directive was invalid"))
        .add_directive("reqwest=info".parse().expect("directive was invalid"))
}
