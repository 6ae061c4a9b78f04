use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::KeyValue;

use crate::resource::Detector;

/// OTLP transport protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// gRPC transport (port 4317).
    Grpc,
    /// HTTP with Protobuf encoding (default, port 4318).
    HttpProtobuf,
    /// HTTP with JSON encoding (port 4318).
    HttpJson,
}

impl Protocol {
    /// Parse an `OTEL_EXPORTER_OTLP_*PROTOCOL` value.
    pub fn from_env_value(value: &str) -> Option<Self> {
        match value {
            "grpc" => Some(Protocol::Grpc),
            "http/protobuf" => Some(Protocol::HttpProtobuf),
            "http/json" => Some(Protocol::HttpJson),
            _ => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protocol::Grpc => "grpc",
            Protocol::HttpProtobuf => "http/protobuf",
            Protocol::HttpJson => "http/json",
        })
    }
}

/// Configuration options for [`start`](crate::start).
///
/// Use [`OtelOptions::builder()`] to construct an instance.
/// All fields are optional; unset values fall back to environment variables, then defaults.
#[derive(Debug, Clone, Default)]
pub struct OtelOptions {
    pub(crate) resource_attributes: Vec<KeyValue>,
    pub(crate) detectors: Vec<Arc<dyn Detector>>,
    pub(crate) protocol: Option<Protocol>,
    pub(crate) endpoint: Option<String>,
    pub(crate) export_timeout: Option<Duration>,
}

impl OtelOptions {
    /// Create a new builder for `OtelOptions`.
    pub fn builder() -> OtelOptionsBuilder {
        OtelOptionsBuilder::default()
    }
}

/// Builder for [`OtelOptions`].
#[derive(Debug, Default)]
pub struct OtelOptionsBuilder {
    resource_attributes: Vec<KeyValue>,
    detectors: Vec<Arc<dyn Detector>>,
    protocol: Option<Protocol>,
    endpoint: Option<String>,
    export_timeout: Option<Duration>,
}

impl OtelOptionsBuilder {
    /// Add resource attributes (e.g. `("deployment.environment.name", "production")`).
    ///
    /// These override every detected attribute with the same key. When a key
    /// repeats, the last value wins.
    pub fn resource_attributes(
        mut self,
        attrs: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.resource_attributes.extend(
            attrs
                .into_iter()
                .map(|(k, v)| KeyValue::new(k.into(), v.into())),
        );
        self
    }

    /// Add a single typed resource attribute.
    pub fn resource_attribute(mut self, kv: KeyValue) -> Self {
        self.resource_attributes.push(kv);
        self
    }

    /// Add a resource detector, run after the built-in ones.
    pub fn detector(mut self, detector: impl Detector + 'static) -> Self {
        self.detectors.push(Arc::new(detector));
        self
    }

    /// Set the OTLP transport protocol for all signals.
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Set the OTLP collector base endpoint (e.g. `"http://collector:4318"`).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the export timeout for OTLP requests.
    pub fn export_timeout(mut self, timeout: Duration) -> Self {
        self.export_timeout = Some(timeout);
        self
    }

    /// Build the [`OtelOptions`].
    pub fn build(self) -> OtelOptions {
        OtelOptions {
            resource_attributes: self.resource_attributes,
            detectors: self.detectors,
            protocol: self.protocol,
            endpoint: self.endpoint,
            export_timeout: self.export_timeout,
        }
    }
}
