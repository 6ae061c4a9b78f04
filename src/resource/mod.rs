//! Resource assembly from built-in and caller-supplied detectors.

mod detectors;
mod ecs;

use std::fmt;

use opentelemetry::{Key, KeyValue};
use opentelemetry_sdk::resource::{EnvResourceDetector, TelemetryResourceDetector};
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::SERVICE_NAME;

use crate::context::CallContext;
use crate::env::service_name_from_env;
use crate::error::{BoxError, ContextError, DetectorError, ResourceError};
use crate::options::OtelOptions;

pub use detectors::{ContainerDetector, HostDetector, ProcessDetector, SdkDetector};
pub use ecs::EcsDetector;

/// A source of resource attributes.
///
/// Implementations should return `Ok` with no attributes when their source
/// does not apply, and `Err` only when it applies but cannot be read.
pub trait Detector: fmt::Debug + Send + Sync {
    /// Short name used in diagnostics and [`DetectorError`].
    fn name(&self) -> &str;

    fn detect(&self) -> Result<Vec<KeyValue>, BoxError>;
}

/// A resource together with the detectors that failed while building it.
#[derive(Debug)]
pub(crate) struct BuiltResource {
    pub resource: Resource,
    /// The `service.name` that won precedence.
    pub service_name: String,
    pub error: Option<ResourceError>,
}

/// `OTEL_SERVICE_NAME`, which outranks `service.name` in
/// `OTEL_RESOURCE_ATTRIBUTES` and the name passed to start.
#[derive(Debug)]
struct ServiceNameFromEnv;

impl Detector for ServiceNameFromEnv {
    fn name(&self) -> &str {
        "service.name"
    }

    fn detect(&self) -> Result<Vec<KeyValue>, BoxError> {
        Ok(service_name_from_env()
            .map(|name| vec![KeyValue::new(SERVICE_NAME, name)])
            .unwrap_or_default())
    }
}

/// Build the process resource.
///
/// Sources are merged in this order, later ones overriding earlier ones:
/// `service_name`, container, process, `OTEL_RESOURCE_ATTRIBUTES`,
/// `OTEL_SERVICE_NAME`, host, telemetry SDK, ECS, caller detectors, caller
/// attributes.
///
/// A failing detector contributes nothing; the others still run.
pub(crate) fn build_resource(
    ctx: &CallContext,
    service_name: &str,
    opts: &OtelOptions,
) -> Result<BuiltResource, ContextError> {
    ctx.check()?;

    let env = SdkDetector::new("env", EnvResourceDetector::new());
    let telemetry = SdkDetector::new("telemetry.sdk", TelemetryResourceDetector);

    let mut detectors: Vec<&dyn Detector> = vec![
        &ContainerDetector,
        &ProcessDetector,
        &env,
        &ServiceNameFromEnv,
        &HostDetector,
        &telemetry,
        &EcsDetector,
    ];
    detectors.extend(opts.detectors.iter().map(|d| d.as_ref()));

    let mut builder = Resource::builder_empty()
        .with_attribute(KeyValue::new(SERVICE_NAME, service_name.to_owned()));
    let mut failures = Vec::new();

    for detector in detectors {
        ctx.check()?;
        match detector.detect() {
            Ok(attrs) => builder = builder.with_attributes(attrs),
            Err(source) => {
                tracing::warn!(
                    target: "obs_lifecycle",
                    detector = detector.name(),
                    error = %source,
                    "resource detector failed"
                );
                failures.push(DetectorError::new(detector.name(), source));
            }
        }
    }

    let resource = builder
        .with_attributes(opts.resource_attributes.iter().cloned())
        .build();
    let service_name = resource
        .get(&Key::from_static_str(SERVICE_NAME))
        .map_or_else(|| service_name.to_owned(), |value| value.to_string());

    Ok(BuiltResource {
        resource,
        service_name,
        error: (!failures.is_empty()).then(|| ResourceError::new(failures)),
    })
}
