use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
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
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
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

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "alexpetro_cache_hit_total",
            Unit::Count,
            "Total number of content cache hits."
        );
        describe_counter!(
            "alexpetro_cache_miss_total",
            Unit::Count,
            "Total number of content cache misses."
        );
        describe_gauge!(
            "alexpetro_stream_clients",
            Unit::Count,
            "Currently connected SSE clients."
        );
        describe_counter!(
            "alexpetro_stream_events_total",
            Unit::Count,
            "Total number of change events broadcast."
        );
        describe_counter!(
            "alexpetro_stream_send_failed_total",
            Unit::Count,
            "Per-client deliveries skipped because the channel was full or closed."
        );
        describe_counter!(
            "alexpetro_contact_rate_limited_total",
            Unit::Count,
            "Contact submissions rejected by the rate limiter."
        );
        describe_counter!(
            "alexpetro_mail_dropped_total",
            Unit::Count,
            "Contact notifications dropped because the mail queue was full."
        );
    });
}
