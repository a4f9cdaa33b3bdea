use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::metric_names::{
    METRIC_EVICT, METRIC_EXPIRE, METRIC_HIT, METRIC_LOCK_POISONED, METRIC_MISS,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_HIT,
            Unit::Count,
            "Entry cache lookups answered from memory, labelled by index."
        );
        describe_counter!(
            METRIC_MISS,
            Unit::Count,
            "Entry cache lookups that fell through to the backend."
        );
        describe_counter!(
            METRIC_EVICT,
            Unit::Count,
            "Entries pushed out of a cache because it was full."
        );
        describe_counter!(
            METRIC_EXPIRE,
            Unit::Count,
            "Entries dropped on lookup because their time to live elapsed."
        );
        describe_counter!(
            METRIC_LOCK_POISONED,
            Unit::Count,
            "Cache locks recovered after a panic in another task."
        );
    });
}
