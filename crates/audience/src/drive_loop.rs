use std::{future::Future, sync::Arc, time::Duration};

use meeting::HandSignalSource;
use robot::Actuator;
use shared::{
    domain::ActuatorCommand,
    error::{ActuatorError, InvalidCount, SourceError},
};
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::coordinator::{AudienceCoordinator, CoordinatorError, WiggleSettings};

const SHUTDOWN_RETRY_DELAY: Duration = Duration::from_millis(250);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveSettings {
    /// Minimum spacing between polls. Slow polls push the next one back.
    pub poll_interval: Duration,
    /// Transient poll failures in a row before the source counts as lost.
    pub max_consecutive_source_failures: u32,
    /// Failed actuator commands in a row before the loop gives up.
    pub max_consecutive_actuator_failures: u32,
    /// Attempts at the final lower before exiting with an error.
    pub shutdown_lower_attempts: u32,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_consecutive_source_failures: 5,
            max_consecutive_actuator_failures: 3,
            shutdown_lower_attempts: 3,
        }
    }
}

/// Why a loop that ended cleanly stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    MeetingEnded,
}

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("signal source failed: {0}")]
    Source(SourceError),
    #[error("signal source failed {failures} polls in a row, last: {last}")]
    SourceExhausted { failures: u32, last: SourceError },
    #[error("signal source broke its contract: {0}")]
    InvalidCount(#[from] InvalidCount),
    #[error("actuator failed {failures} commands in a row, last: {last}")]
    Actuator { failures: u32, last: ActuatorError },
    #[error("failed to connect actuator: {0}")]
    Connect(ActuatorError),
    #[error("hand could not be confirmed lowered: {0}")]
    Cleanup(ActuatorError),
}

/// Polls a meeting and drives an [`AudienceCoordinator`] until told to stop
/// or the meeting can no longer be observed.
///
/// Whatever ends the loop, the hand is lowered before the source and then
/// the actuator are released.
pub struct DriveLoop {
    source: Arc<dyn HandSignalSource>,
    actuator: Arc<dyn Actuator>,
    coordinator: AudienceCoordinator,
    settings: DriveSettings,
    source_failures: u32,
    actuator_failures: u32,
}

impl DriveLoop {
    pub fn new(
        source: Arc<dyn HandSignalSource>,
        actuator: Arc<dyn Actuator>,
        wiggle: WiggleSettings,
        settings: DriveSettings,
    ) -> Self {
        let coordinator = AudienceCoordinator::new(Arc::clone(&actuator), wiggle);
        Self {
            source,
            actuator,
            coordinator,
            settings,
            source_failures: 0,
            actuator_failures: 0,
        }
    }

    /// Run until `shutdown` resolves or polling fails for good, then clean up.
    ///
    /// Returns `Ok` only when the loop stopped cleanly and the final lower
    /// was confirmed by the actuator.
    pub async fn run<F>(mut self, shutdown: F) -> Result<StopReason, DriveError>
    where
        F: Future<Output = ()>,
    {
        let outcome = self.poll_until_stopped(shutdown).await;
        match &outcome {
            Ok(reason) => info!(?reason, "drive: stopping"),
            Err(err) => error!(error = %err, "drive: stopping on failure"),
        }

        let cleanup = self.clean_up().await;
        match (outcome, cleanup) {
            (Ok(reason), Ok(())) => Ok(reason),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(cleanup_err)) => {
                error!(error = %cleanup_err, "drive: hand may still be raised");
                Err(err)
            }
        }
    }

    async fn poll_until_stopped<F>(&mut self, shutdown: F) -> Result<StopReason, DriveError>
    where
        F: Future<Output = ()>,
    {
        let mut shutdown = std::pin::pin!(shutdown);
        let period = self.settings.poll_interval.max(MIN_POLL_INTERVAL);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => return Ok(StopReason::Interrupted),
                _ = ticker.tick() => {}
            }

            // An in-flight poll is abandoned on interrupt; actuator calls
            // below are never raced against shutdown.
            let polled = tokio::select! {
                biased;
                _ = &mut shutdown => return Ok(StopReason::Interrupted),
                polled = self.source.current_raised_hand_count() => polled,
            };
            if let Some(reason) = self.apply_poll(polled).await? {
                return Ok(reason);
            }

            let ticked = self.coordinator.tick(Instant::now()).await;
            self.record_actuator(ticked)?;
        }
    }

    async fn apply_poll(
        &mut self,
        polled: Result<i64, SourceError>,
    ) -> Result<Option<StopReason>, DriveError> {
        match polled {
            Ok(count) => {
                self.source_failures = 0;
                debug!(count, "drive: polled");
                match self.coordinator.set_count(count).await {
                    Ok(issued) => self.record_actuator(Ok(issued))?,
                    Err(CoordinatorError::InvalidInput(err)) => return Err(err.into()),
                    Err(CoordinatorError::Actuator(err)) => self.record_actuator(Err(err))?,
                }
                Ok(None)
            }
            Err(SourceError::MeetingEnded) => {
                info!("drive: meeting ended by host");
                Ok(Some(StopReason::MeetingEnded))
            }
            Err(err @ SourceError::Transient(_)) => {
                self.source_failures += 1;
                warn!(
                    failures = self.source_failures,
                    error = %err,
                    "drive: poll failed, keeping previous count"
                );
                if self.source_failures >= self.settings.max_consecutive_source_failures {
                    return Err(DriveError::SourceExhausted {
                        failures: self.source_failures,
                        last: err,
                    });
                }
                Ok(None)
            }
            Err(err) => Err(DriveError::Source(err)),
        }
    }

    /// Failed commands are not retried here; the next poll or tick that
    /// calls for the same move retries it.
    fn record_actuator(
        &mut self,
        result: Result<Option<ActuatorCommand>, ActuatorError>,
    ) -> Result<(), DriveError> {
        match result {
            Ok(Some(_)) => {
                self.actuator_failures = 0;
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                self.actuator_failures += 1;
                error!(
                    failures = self.actuator_failures,
                    error = %err,
                    "drive: actuator command failed"
                );
                if self.actuator_failures >= self.settings.max_consecutive_actuator_failures {
                    return Err(DriveError::Actuator {
                        failures: self.actuator_failures,
                        last: err,
                    });
                }
                Ok(())
            }
        }
    }

    async fn clean_up(&mut self) -> Result<(), DriveError> {
        let lowered = self.lower_for_exit().await;

        if let Err(err) = self.source.release().await {
            warn!(error = %err, "drive: failed to release signal source");
        }
        if let Err(err) = self.actuator.release().await {
            warn!(error = %err, "drive: failed to release actuator");
        }
        lowered
    }

    async fn lower_for_exit(&mut self) -> Result<(), DriveError> {
        let attempts = self.settings.shutdown_lower_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.coordinator.shutdown().await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < attempts => {
                    warn!(attempt, error = %err, "drive: final lower failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(SHUTDOWN_RETRY_DELAY).await;
                }
                Err(err) => return Err(DriveError::Cleanup(err)),
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/drive_loop_tests.rs"]
mod tests;
