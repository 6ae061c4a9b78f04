use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

use crate::env::env_var_non_empty;

const OTEL_PROPAGATORS: &str = "OTEL_PROPAGATORS";
const DEFAULT_PROPAGATORS: &str = "tracecontext,baggage";

type BoxPropagator = Box<dyn TextMapPropagator + Send + Sync>;

/// Install the global text-map propagator named by `OTEL_PROPAGATORS`.
pub(crate) fn install_propagator() {
    let value = env_var_non_empty(OTEL_PROPAGATORS);
    let propagators = propagators(value.as_deref().unwrap_or(DEFAULT_PROPAGATORS));

    opentelemetry::global::set_text_map_propagator(TextMapCompositePropagator::new(propagators));
}

/// Parse a comma-separated propagator list. `none` anywhere disables propagation.
fn propagators(value: &str) -> Vec<BoxPropagator> {
    let mut propagators: Vec<BoxPropagator> = Vec::new();

    for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match name {
            "tracecontext" => propagators.push(Box::new(TraceContextPropagator::new())),
            "baggage" => propagators.push(Box::new(BaggagePropagator::new())),
            #[cfg(feature = "jaeger")]
            "jaeger" => propagators.push(Box::new(opentelemetry_jaeger_propagator::Propagator::new())),
            "none" => return Vec::new(),
            other => {
                tracing::warn!(
                    target: "obs_lifecycle",
                    propagator = other,
                    "ignoring unsupported propagator"
                );
            }
        }
    }

    propagators
}
