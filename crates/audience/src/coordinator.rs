use std::{sync::Arc, time::Duration};

use robot::Actuator;
use shared::{
    domain::{ActuatorCommand, HandPosition, RaisedHandCount},
    error::{ActuatorError, InvalidCount},
};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};

/// When and how often a hand that stays up gets wiggled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiggleSettings {
    /// Continuous time raised before the first wiggle. Default 30s.
    pub initial_delay: Duration,
    /// Minimum spacing between wiggles after the first. Default 20s.
    pub repeat_interval: Duration,
}

impl Default for WiggleSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(30),
            repeat_interval: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WiggleState {
    #[default]
    Idle,
    Cooldown { last_wiggled_at: Instant },
}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidCount),
    #[error(transparent)]
    Actuator(#[from] ActuatorError),
}

/// Owns the hand's position and timers; the actuator only executes moves.
///
/// Not meant for concurrent use: one drive loop per coordinator. Every
/// method issues at most one actuator command, and the recorded position
/// only changes once the command that produces it has succeeded.
pub struct AudienceCoordinator {
    actuator: Arc<dyn Actuator>,
    settings: WiggleSettings,
    count: RaisedHandCount,
    position: HandPosition,
    raised_since: Option<Instant>,
    wiggle: WiggleState,
}

impl AudienceCoordinator {
    pub fn new(actuator: Arc<dyn Actuator>, settings: WiggleSettings) -> Self {
        Self {
            actuator,
            settings,
            count: RaisedHandCount::ZERO,
            position: HandPosition::Down,
            raised_since: None,
            wiggle: WiggleState::Idle,
        }
    }

    pub fn count(&self) -> RaisedHandCount {
        self.count
    }

    pub fn position(&self) -> HandPosition {
        self.position
    }

    pub fn raised_since(&self) -> Option<Instant> {
        self.raised_since
    }

    pub fn wiggle_state(&self) -> WiggleState {
        self.wiggle
    }

    pub async fn set_count(
        &mut self,
        count: i64,
    ) -> Result<Option<ActuatorCommand>, CoordinatorError> {
        self.set_count_at(count, Instant::now()).await
    }

    /// Record the latest count and move the hand if it crossed zero.
    ///
    /// Going from 3 raised hands to 1 is not a move. A failed raise or
    /// lower leaves the position as it was, so the next update with the
    /// same count retries the move.
    pub async fn set_count_at(
        &mut self,
        count: i64,
        now: Instant,
    ) -> Result<Option<ActuatorCommand>, CoordinatorError> {
        let count = RaisedHandCount::try_from(count)?;
        self.count = count;

        match (self.position, HandPosition::for_count(count)) {
            (HandPosition::Down, HandPosition::Up) => {
                self.actuator.raise().await?;
                self.position = HandPosition::Up;
                self.raised_since = Some(now);
                self.wiggle = WiggleState::Idle;
                info!(count = count.0, "audience: hand raised");
                Ok(Some(ActuatorCommand::Raise))
            }
            (HandPosition::Up, HandPosition::Down) => {
                self.actuator.lower().await?;
                self.mark_lowered();
                info!("audience: hand lowered");
                Ok(Some(ActuatorCommand::Lower))
            }
            _ => {
                debug!(count = count.0, position = ?self.position, "audience: no move");
                Ok(None)
            }
        }
    }

    /// Wiggle if the hand has been up long enough and the last wiggle is
    /// far enough behind. No effect while the hand is down, or while a
    /// lower for a zero count is still pending after a failed attempt.
    pub async fn tick(&mut self, now: Instant) -> Result<Option<ActuatorCommand>, ActuatorError> {
        if self.position != HandPosition::Up || !self.count.any_raised() {
            return Ok(None);
        }
        let Some(raised_since) = self.raised_since else {
            return Ok(None);
        };

        let raised_for = now.saturating_duration_since(raised_since);
        if raised_for < self.settings.initial_delay {
            return Ok(None);
        }
        if let WiggleState::Cooldown { last_wiggled_at } = self.wiggle {
            if now.saturating_duration_since(last_wiggled_at) < self.settings.repeat_interval {
                return Ok(None);
            }
        }

        // Cooldown starts on the attempt: a failed wiggle waits a full
        // interval like a successful one.
        self.wiggle = WiggleState::Cooldown {
            last_wiggled_at: now,
        };
        debug!(raised_ms = raised_for.as_millis() as u64, "audience: wiggling");
        self.actuator.wiggle().await?;
        Ok(Some(ActuatorCommand::Wiggle))
    }

    /// Lower the hand no matter what the recorded position is.
    ///
    /// Every call issues a lower, so calling it again after a failed or
    /// uncertain attempt is safe and never raises.
    pub async fn shutdown(&mut self) -> Result<(), ActuatorError> {
        let previous = self.position;
        self.mark_lowered();
        self.actuator.lower().await?;
        info!(previous = ?previous, "audience: hand lowered for shutdown");
        Ok(())
    }

    fn mark_lowered(&mut self) {
        self.position = HandPosition::Down;
        self.raised_since = None;
        self.wiggle = WiggleState::Idle;
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
