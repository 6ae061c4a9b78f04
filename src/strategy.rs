use opentelemetry::{Key, Value};
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::DEPLOYMENT_ENVIRONMENT_NAME;

/// The `deployment.environment.name` value that switches to synchronous export.
pub const LOCAL_ENVIRONMENT: &str = "local";

/// How finished spans and log records reach their exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStrategy {
    /// Export each record on the calling thread as soon as it ends.
    Synchronous,
    /// Buffer records and export them from a background worker.
    Batched,
}

impl ProcessingStrategy {
    /// `Synchronous` for the `local` environment, `Batched` for anything else,
    /// including no environment at all.
    pub fn for_environment(environment: Option<&str>) -> Self {
        match environment {
            Some(LOCAL_ENVIRONMENT) => ProcessingStrategy::Synchronous,
            _ => ProcessingStrategy::Batched,
        }
    }
}

/// Read `deployment.environment.name` from `resource`.
///
/// Non-string values count as unset.
pub fn deployment_environment(resource: &Resource) -> Option<String> {
    match resource.get(&Key::from_static_str(DEPLOYMENT_ENVIRONMENT_NAME)) {
        Some(Value::String(value)) => Some(value.as_str().to_owned()),
        _ => None,
    }
}
