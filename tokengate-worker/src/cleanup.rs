/// Periodic eviction of expired revocation entries
///
/// An entry only has to live until the token it names would be rejected by its
/// own expiry, so the job deletes everything at or past expiry on a fixed
/// interval. Several jobs (or the admin endpoint) may run eviction at once;
/// every backend removes each entry exactly once.
///
/// # Interval Bounds
///
/// - No interval specified: 1 hour
/// - Minimum: 1 second
/// - Maximum: 24 hours
///
/// # Example
///
/// ```no_run
/// use tokengate_worker::cleanup::CleanupJob;
/// use tokengate_shared::auth::AuthService;
/// use tokio_util::sync::CancellationToken;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example(service: Arc<AuthService>) {
/// let shutdown = CancellationToken::new();
/// let job = CleanupJob::new(service, Duration::from_secs(3600));
///
/// let handle = job.spawn(shutdown.clone());
///
/// // Later...
/// shutdown.cancel();
/// let evicted = handle.await.unwrap_or(0);
/// # }
/// ```

use std::sync::Arc;
use std::time::Duration;
use tokengate_shared::auth::{AuthError, AuthService};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Default eviction interval (1 hour)
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3600);

/// Minimum allowed interval (1 second)
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Maximum allowed interval (24 hours)
pub const MAX_INTERVAL: Duration = Duration::from_secs(86400);

/// Revocation cleanup job
#[derive(Debug, Clone)]
pub struct CleanupJob {
    service: Arc<AuthService>,
    interval: Duration,
}

impl CleanupJob {
    /// Creates a job that runs every `interval`
    ///
    /// The interval is clamped to [`MIN_INTERVAL`]..=[`MAX_INTERVAL`].
    pub fn new(service: Arc<AuthService>, interval: Duration) -> Self {
        CleanupJob {
            service,
            interval: interval.clamp(MIN_INTERVAL, MAX_INTERVAL),
        }
    }

    /// Creates a job from a configured interval in seconds (None = default)
    pub fn from_interval_secs(service: Arc<AuthService>, interval_secs: Option<u64>) -> Self {
        let interval = interval_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_INTERVAL);

        CleanupJob::new(service, interval)
    }

    /// Gets the eviction interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Performs one eviction pass
    ///
    /// # Errors
    ///
    /// Returns `AuthError::StoreUnavailable` if the store fails or times out
    pub async fn run_once(&self) -> Result<u64, AuthError> {
        self.service.cleanup().await
    }

    /// Runs eviction every interval until `shutdown` is cancelled
    ///
    /// The first pass runs immediately. Failed passes are logged and the loop
    /// carries on. The handle resolves to the total number of entries evicted.
    pub fn spawn(&self, shutdown: CancellationToken) -> JoinHandle<u64> {
        let job = self.clone();

        tokio::spawn(async move {
            let mut ticker = interval(job.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut total: u64 = 0;
            let mut passes: u64 = 0;

            tracing::info!(interval_secs = job.interval.as_secs(), "Revocation cleanup job started");

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                passes += 1;
                match job.run_once().await {
                    Ok(evicted) => {
                        total += evicted;
                        tracing::debug!(pass = passes, evicted, "Cleanup pass finished");
                    }
                    Err(e) => {
                        tracing::error!(pass = passes, error = %e, "Cleanup pass failed");
                    }
                }
            }

            tracing::info!(passes, total_evicted = total, "Revocation cleanup job stopped");
            total
        })
    }
}
