use std::sync::Arc;

use async_trait::async_trait;
use shared::error::ActuatorError;

mod http;
mod servo;
mod simulated;

pub use http::HttpServo;
pub use servo::{Servo, ServoActuator, ServoActuatorConnector, ServoBackend, ServoGeometry};
pub use simulated::SimulatedServo;

/// A single physical degree of freedom that can hold a hand up or down.
///
/// Implementations carry no notion of position; callers own that record.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn raise(&self) -> Result<(), ActuatorError>;
    async fn lower(&self) -> Result<(), ActuatorError>;
    async fn wiggle(&self) -> Result<(), ActuatorError>;

    /// Close the hardware connection. Called once, after the final lower.
    async fn release(&self) -> Result<(), ActuatorError> {
        Ok(())
    }
}

#[async_trait]
pub trait ActuatorConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Actuator>, ActuatorError>;
}
