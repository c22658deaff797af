use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::Servo;

/// In-memory servo that logs every move. Clones share one history.
#[derive(Debug, Clone, Default)]
pub struct SimulatedServo {
    angles: Arc<Mutex<Vec<u32>>>,
}

impl SimulatedServo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn history(&self) -> Vec<u32> {
        self.angles.lock().await.clone()
    }

    pub async fn current_angle(&self) -> Option<u32> {
        self.angles.lock().await.last().copied()
    }
}

#[async_trait]
impl Servo for SimulatedServo {
    async fn move_to(&self, angle: u32) -> anyhow::Result<()> {
        info!(angle, "servo(sim): moved");
        self.angles.lock().await.push(angle);
        Ok(())
    }
}
