//! Periodic session check scheduler
//!
//! Re-validates the local session against the backend on a fixed cadence
//! while the process runs. Ticks are serialized by construction: the loop
//! awaits each validation before sleeping again, so two checks can never
//! mutate the auth store concurrently. Stopping cancels the timer but not
//! an in-flight validation; its write-back still passes through the auth
//! store's epoch guard.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use opencircle_infra::scheduling::{SessionScheduler, SessionSchedulerConfig};
//!
//! # async fn example(validator: Arc<opencircle_core::SessionValidator>) -> Result<(), opencircle_infra::SchedulerError> {
//! let mut scheduler = SessionScheduler::new(
//!     validator,
//!     SessionSchedulerConfig {
//!         interval: Duration::from_secs(300), // 5 minutes
//!         enabled: true,
//!     },
//! );
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use opencircle_core::{FailurePolicy, SessionValidation, SessionValidator};
use opencircle_domain::SessionConfig;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the session scheduler
#[derive(Debug, Clone)]
pub struct SessionSchedulerConfig {
    /// Check cadence; a zero interval disables the timer
    pub interval: Duration,
    /// Whether the periodic check runs at all
    pub enabled: bool,
}

impl Default for SessionSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300), // 5 minutes
            enabled: true,
        }
    }
}

impl From<&SessionConfig> for SessionSchedulerConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.check_interval_seconds),
            enabled: config.check_enabled,
        }
    }
}

/// Periodic session check scheduler
pub struct SessionScheduler {
    validator: Arc<SessionValidator>,
    config: SessionSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl SessionScheduler {
    /// Create a new session scheduler
    ///
    /// # Arguments
    ///
    /// * `validator` - Session validator driving each check
    /// * `config` - Scheduler configuration
    pub fn new(validator: Arc<SessionValidator>, config: SessionSchedulerConfig) -> Self {
        Self {
            validator,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the scheduler
    ///
    /// Spawns a background task that validates the session periodically.
    /// With the check disabled or a zero interval, start succeeds without
    /// spawning anything.
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        if !self.config.enabled || self.config.interval.is_zero() {
            info!("session check disabled; scheduler not started");
            return Ok(());
        }

        info!(interval_secs = self.config.interval.as_secs(), "starting session scheduler");

        // Create a new cancellation token (supports restart after stop)
        self.cancellation_token = CancellationToken::new();

        let validator = Arc::clone(&self.validator);
        let interval = self.config.interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::check_loop(validator, interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        info!("session scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// Cancels the background task and awaits completion.
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler is not running
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("stopping session scheduler");

        // Cancel background task
        self.cancellation_token.cancel();

        // Await handle with timeout
        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("session scheduler stopped");
        Ok(())
    }

    /// Check if the scheduler is running
    ///
    /// A scheduler is considered running if it has an active task handle
    /// that hasn't finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Background check loop
    async fn check_loop(
        validator: Arc<SessionValidator>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("session check loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    // The validator short-circuits without network traffic
                    // when no session is established locally. Transient
                    // failures stay silent here; only a definitive verdict
                    // clears the session.
                    match validator
                        .validate_session_with_policy(FailurePolicy::KeepOnTransient)
                        .await
                    {
                        SessionValidation::Valid => debug!("periodic check: session confirmed"),
                        SessionValidation::Invalid => {
                            debug!("periodic check: no valid session");
                        }
                        SessionValidation::Failed(err) => {
                            warn!(error = %err, "periodic check failed");
                        }
                    }
                }
            }
        }
    }
}

/// Ensure scheduler is stopped when dropped
impl Drop for SessionScheduler {
    fn drop(&mut self) {
        // Can't join the task here (async); cancelling the token is the
        // best-effort cleanup available in Drop.
        if !self.cancellation_token.is_cancelled() {
            self.cancellation_token.cancel();
        }
    }
}
