use std::sync::Once;

use metrics::{Unit, describe_counter};
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
            "permiso_applications_submitted_total",
            Unit::Count,
            "Total number of permit applications submitted."
        );
        describe_counter!(
            "permiso_transitions_accepted_total",
            Unit::Count,
            "Total number of accepted status transitions."
        );
        describe_counter!(
            "permiso_transitions_rejected_total",
            Unit::Count,
            "Total number of status transitions rejected by workflow rules."
        );
        describe_counter!(
            "permiso_write_conflict_retries_total",
            Unit::Count,
            "Total number of optimistic write conflicts that triggered a retry."
        );
        describe_counter!(
            "permiso_permits_issued_total",
            Unit::Count,
            "Total number of permit numbers issued."
        );
    });
}
