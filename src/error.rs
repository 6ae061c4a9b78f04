use std::error::Error as StdError;
use std::fmt;

use opentelemetry_sdk::error::OTelSdkError;
use thiserror::Error;

use crate::options::Protocol;
use crate::shutdown::Shutdown;
use crate::signal::Signal;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Why a [`CallContext`](crate::CallContext) is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// A single resource detector that could not produce its attributes.
#[derive(Debug, Error)]
#[error("resource detector `{detector}` failed")]
pub struct DetectorError {
    detector: String,
    #[source]
    source: BoxError,
}

impl DetectorError {
    pub fn new(detector: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            detector: detector.into(),
            source: source.into(),
        }
    }

    pub fn detector(&self) -> &str {
        &self.detector
    }
}

/// The resource was assembled, but one or more detectors failed and their
/// attributes are missing from it.
#[derive(Debug, Error)]
#[error("partial resource: {} detector(s) failed", .failures.len())]
pub struct ResourceError {
    failures: Vec<DetectorError>,
}

impl ResourceError {
    pub(crate) fn new(failures: Vec<DetectorError>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[DetectorError] {
        &self.failures
    }
}

/// Failure to acquire the exporter for one signal.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("unsupported value `{value}` for {variable}")]
    Unsupported {
        variable: &'static str,
        value: String,
    },

    #[error(
        "{protocol} transport requested for {signal} but the `{feature}` feature is not enabled"
    )]
    TransportDisabled {
        signal: Signal,
        protocol: Protocol,
        feature: &'static str,
    },

    #[error("failed to build OTLP {signal} exporter")]
    Build {
        signal: Signal,
        #[source]
        source: opentelemetry_otlp::ExporterBuildError,
    },

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Other(BoxError),
}

/// Error returned by [`start`](crate::start).
#[derive(Debug, Error)]
pub enum StartError {
    #[error("startup aborted")]
    Context(#[from] ContextError),

    #[error("failed to build resource")]
    Resource(#[from] ResourceError),

    #[error("failed to acquire span exporter")]
    SpanExporter(#[source] ExporterError),

    #[error("failed to acquire metric exporter")]
    MetricExporter(#[source] ExporterError),

    #[error("failed to acquire log exporter")]
    LogExporter(#[source] ExporterError),
}

impl StartError {
    pub(crate) fn exporter(signal: Signal, source: ExporterError) -> Self {
        match signal {
            Signal::Traces => StartError::SpanExporter(source),
            Signal::Metrics => StartError::MetricExporter(source),
            Signal::Logs => StartError::LogExporter(source),
        }
    }

    /// The cancellation cause, if startup stopped because its context was done.
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            StartError::Context(err)
            | StartError::SpanExporter(ExporterError::Context(err))
            | StartError::MetricExporter(ExporterError::Context(err))
            | StartError::LogExporter(ExporterError::Context(err)) => Some(*err),
            _ => None,
        }
    }

    /// The signal whose exporter could not be acquired.
    pub fn signal(&self) -> Option<Signal> {
        match self {
            StartError::SpanExporter(_) => Some(Signal::Traces),
            StartError::MetricExporter(_) => Some(Signal::Metrics),
            StartError::LogExporter(_) => Some(Signal::Logs),
            StartError::Context(_) | StartError::Resource(_) => None,
        }
    }
}

/// A failed [`start`](crate::start), together with the shutdown for whatever
/// was acquired before the failure.
///
/// The shutdown is always safe to invoke. For [`StartError::Resource`] the
/// bootstrap otherwise completed, and the shutdown covers all three signals.
pub struct StartFailure {
    error: StartError,
    shutdown: Shutdown,
}

impl StartFailure {
    pub(crate) fn new(error: impl Into<StartError>, shutdown: Shutdown) -> Self {
        Self {
            error: error.into(),
            shutdown,
        }
    }

    pub fn error(&self) -> &StartError {
        &self.error
    }

    pub fn shutdown(&mut self) -> &mut Shutdown {
        &mut self.shutdown
    }

    pub fn into_parts(self) -> (StartError, Shutdown) {
        (self.error, self.shutdown)
    }
}

impl fmt::Debug for StartFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartFailure")
            .field("error", &self.error)
            .field("shutdown", &self.shutdown)
            .finish()
    }
}

impl fmt::Display for StartFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl StdError for StartFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.error.source()
    }
}

impl From<StartFailure> for StartError {
    fn from(failure: StartFailure) -> Self {
        failure.error
    }
}

/// Failure of one release operation during shutdown.
#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error(transparent)]
    Sdk(#[from] OTelSdkError),

    #[error("release abandoned: {0}")]
    Abandoned(ContextError),

    #[error("release operation panicked")]
    Panicked,

    #[error("failed to spawn release thread")]
    Spawn(#[source] std::io::Error),
}

#[derive(Debug)]
pub struct ReleaseFailure {
    signal: Signal,
    error: ReleaseError,
}

impl ReleaseFailure {
    pub(crate) fn new(signal: Signal, error: ReleaseError) -> Self {
        Self { signal, error }
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn error(&self) -> &ReleaseError {
        &self.error
    }
}

impl fmt::Display for ReleaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.signal, self.error)
    }
}

/// Every release operation that failed during one shutdown, in release order.
#[derive(Debug)]
pub struct ShutdownError {
    failures: Vec<ReleaseFailure>,
}

impl ShutdownError {
    pub(crate) fn new(failures: Vec<ReleaseFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[ReleaseFailure] {
        &self.failures
    }

    /// Whether the release for `signal` failed.
    pub fn failed(&self, signal: Signal) -> bool {
        self.failures.iter().any(|f| f.signal == signal)
    }
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl StdError for ShutdownError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.failures
            .first()
            .map(|failure| &failure.error as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_error_is_found_through_exporter_errors() {
        let err = StartError::exporter(Signal::Logs, ExporterError::Context(ContextError::Canceled));
        assert_eq!(err.context_error(), Some(ContextError::Canceled));
        assert_eq!(err.signal(), Some(Signal::Logs));

        let err = StartError::from(ContextError::DeadlineExceeded);
        assert_eq!(err.context_error(), Some(ContextError::DeadlineExceeded));
        assert_eq!(err.signal(), None);
    }

    #[test]
    fn shutdown_error_lists_every_failure() {
        let err = ShutdownError::new(vec![
            ReleaseFailure::new(Signal::Traces, OTelSdkError::AlreadyShutdown.into()),
            ReleaseFailure::new(Signal::Logs, ReleaseError::Abandoned(ContextError::Canceled)),
        ]);

        let text = err.to_string();
        assert!(text.starts_with("traces: "));
        assert!(text.contains("\nlogs: release abandoned: context canceled"));
        assert!(err.failed(Signal::Traces));
        assert!(!err.failed(Signal::Metrics));
        assert!(err.source().is_some());
    }
}
