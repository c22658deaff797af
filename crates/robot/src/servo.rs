use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{domain::ActuatorCommand, error::ActuatorError};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{http::HttpServo, simulated::SimulatedServo, Actuator, ActuatorConnector};

/// Low-level positional servo.
#[async_trait]
pub trait Servo: Send + Sync {
    async fn move_to(&self, angle: u32) -> anyhow::Result<()>;

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Angles and timing for the hand's moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServoGeometry {
    pub upper_angle: u32,
    pub lower_angle: u32,
    /// Extra angle past `upper_angle` reached on each wiggle stroke.
    pub wiggle_amount: u32,
    pub wiggle_cycles: u32,
    pub wiggle_step: Duration,
}

impl Default for ServoGeometry {
    fn default() -> Self {
        Self {
            upper_angle: 30,
            lower_angle: 0,
            wiggle_amount: 5,
            wiggle_cycles: 3,
            wiggle_step: Duration::from_millis(300),
        }
    }
}

pub struct ServoActuator<S> {
    servo: S,
    geometry: ServoGeometry,
    // Held for the whole of a move so a wiggle is never interleaved with a lower.
    moving: Mutex<()>,
}

impl<S: Servo> ServoActuator<S> {
    pub fn new(servo: S, geometry: ServoGeometry) -> Self {
        Self {
            servo,
            geometry,
            moving: Mutex::new(()),
        }
    }

    async fn move_to(&self, command: ActuatorCommand, angle: u32) -> Result<(), ActuatorError> {
        debug!(%command, angle, "servo: move");
        self.servo
            .move_to(angle)
            .await
            .map_err(|err| ActuatorError::command(command, err.to_string()))
    }
}

#[async_trait]
impl<S: Servo> Actuator for ServoActuator<S> {
    async fn raise(&self) -> Result<(), ActuatorError> {
        let _guard = self.moving.lock().await;
        self.move_to(ActuatorCommand::Raise, self.geometry.upper_angle)
            .await
    }

    async fn lower(&self) -> Result<(), ActuatorError> {
        let _guard = self.moving.lock().await;
        self.move_to(ActuatorCommand::Lower, self.geometry.lower_angle)
            .await
    }

    async fn wiggle(&self) -> Result<(), ActuatorError> {
        let _guard = self.moving.lock().await;
        let peak = self.geometry.upper_angle + self.geometry.wiggle_amount;
        for _ in 0..self.geometry.wiggle_cycles {
            self.move_to(ActuatorCommand::Wiggle, peak).await?;
            tokio::time::sleep(self.geometry.wiggle_step).await;
            self.move_to(ActuatorCommand::Wiggle, self.geometry.upper_angle)
                .await?;
            tokio::time::sleep(self.geometry.wiggle_step).await;
        }
        Ok(())
    }

    async fn release(&self) -> Result<(), ActuatorError> {
        self.servo
            .close()
            .await
            .map_err(|err| ActuatorError::Connect(err.to_string()))
    }
}

#[derive(Debug, Clone)]
pub enum ServoBackend {
    Simulated(SimulatedServo),
    Http {
        base_url: String,
        secret: Option<String>,
    },
}

/// Builds a [`ServoActuator`] and parks the hand at the lowered angle.
pub struct ServoActuatorConnector {
    backend: ServoBackend,
    geometry: ServoGeometry,
}

impl ServoActuatorConnector {
    pub fn new(backend: ServoBackend, geometry: ServoGeometry) -> Self {
        Self { backend, geometry }
    }
}

async fn start_lowered<S: Servo + 'static>(
    servo: S,
    geometry: ServoGeometry,
) -> Result<Arc<dyn Actuator>, ActuatorError> {
    let actuator = ServoActuator::new(servo, geometry);
    actuator.lower().await?;
    Ok(Arc::new(actuator))
}

#[async_trait]
impl ActuatorConnector for ServoActuatorConnector {
    async fn connect(&self) -> Result<Arc<dyn Actuator>, ActuatorError> {
        let actuator = match &self.backend {
            ServoBackend::Simulated(servo) => {
                start_lowered(servo.clone(), self.geometry.clone()).await?
            }
            ServoBackend::Http { base_url, secret } => {
                let servo = HttpServo::connect(base_url, secret.clone()).await?;
                start_lowered(servo, self.geometry.clone()).await?
            }
        };
        info!("robot: connected, hand lowered");
        Ok(actuator)
    }
}

#[cfg(test)]
#[path = "tests/servo_tests.rs"]
mod tests;
