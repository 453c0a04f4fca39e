//! Global tracing subscriber.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    filter::Directive,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Dependencies that are chatty at `info`.
const QUIET_TARGETS: &[&str] = &["sqlx::query=warn", "hyper=warn", "reqwest=warn"];

fn build_filter(level: &str) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    let mut filter = EnvFilter::try_new(level)?;
    for directive in QUIET_TARGETS {
        filter = filter.add_directive(directive.parse::<Directive>()?);
    }
    Ok(filter)
}

/// Installs the global subscriber. `RUST_LOG` replaces `logging.level` and the
/// quiet-target defaults entirely.
///
/// Formats: `json` (default in production), `compact` and anything else as pretty.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.level)?,
    };

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()?,
        "compact" => subscriber
            .with(fmt::layer().compact().with_target(false))
            .try_init()?,
        _ => subscriber
            .with(
                fmt::layer()
                    .pretty()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true),
            )
            .try_init()?,
    }
    Ok(())
}
