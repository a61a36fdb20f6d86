use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Targets that follow `--log-level`. Dependencies stay at warn or quieter.
const WARCSEQ_TARGETS: [&str; 3] = ["warcseq", "warcseq_frame", "warcseq_message"];

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    /// Frame and message events share field names; at debug and above the
    /// target tells them apart.
    pub fn shows_targets(self) -> bool {
        self >= LogLevel::Debug
    }
}

/// Per-crate filter for `level`.
pub fn targets(level: LogLevel) -> Targets {
    let filter = level.as_filter();
    WARCSEQ_TARGETS.iter().fold(
        Targets::new().with_default(filter.min(LevelFilter::WARN)),
        |targets, target| targets.with_target(*target, filter),
    )
}

/// Install the stderr subscriber. Stdout carries command output only.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_target(level.shows_targets());

    let result = match format {
        LogFormat::Text => builder.finish().with(targets(level)).try_init(),
        LogFormat::Json => builder.json().finish().with(targets(level)).try_init(),
    };
    if result.is_err() {
        tracing::debug!("log subscriber already installed");
    }
}
