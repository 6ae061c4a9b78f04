use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use opentelemetry_sdk::error::OTelSdkResult;

use crate::context::CallContext;
use crate::error::{ReleaseError, ReleaseFailure, ShutdownError};
use crate::signal::Signal;

/// How often a pending release re-checks its context.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Budget for releases still pending when a [`Shutdown`] is dropped.
const DROP_TIMEOUT: Duration = Duration::from_secs(5);

type ReleaseOp = Box<dyn FnOnce() -> OTelSdkResult + Send + Sync>;

struct Release {
    signal: Signal,
    op: ReleaseOp,
}

/// Teardown for everything [`start`](crate::start) acquired.
///
/// Holds one release operation per acquired exporter, in acquisition order.
/// Calling [`shutdown`](Shutdown::shutdown) runs them all and reports every
/// failure. Dropping a `Shutdown` that still has pending releases runs them
/// with a short timeout and prints failures to stderr.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use obs_bootstrap::CallContext;
///
/// let ctx = CallContext::background();
/// let mut shutdown = obs_bootstrap::start(&ctx, "my-service", None).unwrap();
/// // ... application runs ...
/// let ctx = CallContext::background().with_timeout(Duration::from_secs(10));
/// if let Err(err) = shutdown.shutdown(&ctx) {
///     eprintln!("telemetry shutdown: {err}");
/// }
/// ```
#[must_use = "dropping the Shutdown immediately tears down every provider; \
              hold it for the lifetime of your application"]
#[derive(Default)]
pub struct Shutdown {
    releases: Vec<Release>,
}

impl Shutdown {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a release operation. Releases run in registration order.
    pub(crate) fn register<F>(&mut self, signal: Signal, op: F)
    where
        F: FnOnce() -> OTelSdkResult + Send + Sync + 'static,
    {
        self.releases.push(Release {
            signal,
            op: Box::new(op),
        });
    }

    /// Number of release operations that have not run yet.
    pub fn pending(&self) -> usize {
        self.releases.len()
    }

    /// Run every pending release operation, in order.
    ///
    /// Each operation runs regardless of earlier failures. An operation still
    /// running when `ctx` is cancelled or its deadline passes is abandoned and
    /// reported as [`ReleaseError::Abandoned`]; it keeps running in the
    /// background. Releases run at most once, so calling this again returns
    /// `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns a [`ShutdownError`] listing every release that failed.
    pub fn shutdown(&mut self, ctx: &CallContext) -> Result<(), ShutdownError> {
        let releases = std::mem::take(&mut self.releases);

        let failures: Vec<ReleaseFailure> = releases
            .into_iter()
            .filter_map(|release| {
                let signal = release.signal;
                match run_release(ctx, release) {
                    Ok(()) => {
                        tracing::debug!(target: "obs_lifecycle", %signal, "released");
                        None
                    }
                    Err(error) => Some(ReleaseFailure::new(signal, error)),
                }
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShutdownError::new(failures))
        }
    }
}

/// Run `release` on a helper thread and wait for it, giving up once `ctx` is done.
///
/// Every release gets at least one [`POLL_INTERVAL`], whether `ctx` was
/// canceled or its deadline has passed.
fn run_release(ctx: &CallContext, release: Release) -> Result<(), ReleaseError> {
    let Release { signal, op } = release;
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name(format!("obs-release-{signal}"))
        .spawn(move || {
            // The receiver is gone if the release was abandoned.
            let _ = tx.send(op());
        })
        .map_err(ReleaseError::Spawn)?;

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(result) => return result.map_err(ReleaseError::from),
            Err(RecvTimeoutError::Disconnected) => return Err(ReleaseError::Panicked),
            Err(RecvTimeoutError::Timeout) => {
                if let Some(err) = ctx.err() {
                    return Err(ReleaseError::Abandoned(err));
                }
            }
        }
    }
}

impl fmt::Debug for Shutdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shutdown")
            .field(
                "pending",
                &self.releases.iter().map(|r| r.signal).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Drop for Shutdown {
    fn drop(&mut self) {
        if self.releases.is_empty() {
            return;
        }

        let ctx = CallContext::background().with_timeout(DROP_TIMEOUT);
        if let Err(err) = self.shutdown(&ctx) {
            for failure in err.failures() {
                eprintln!(
                    "obs-bootstrap: error shutting down {} provider: {}",
                    failure.signal(),
                    failure.error()
                );
            }
        }
    }
}
