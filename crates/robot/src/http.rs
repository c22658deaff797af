use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use shared::{error::ActuatorError, protocol::ServoMoveRequest};
use tracing::debug;

use crate::Servo;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Servo driven through a robot control endpoint (`POST {base}/servo`).
#[derive(Debug, Clone)]
pub struct HttpServo {
    http: Client,
    base_url: String,
    secret: Option<String>,
}

impl HttpServo {
    /// Build the client and check the endpoint answers `GET {base}/healthz`.
    pub async fn connect(
        base_url: &str,
        secret: Option<String>,
    ) -> Result<Self, ActuatorError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ActuatorError::Connect(err.to_string()))?;
        let servo = Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret,
        };
        servo
            .check_health()
            .await
            .map_err(|err| ActuatorError::Connect(format!("{}: {err}", servo.base_url)))?;
        Ok(servo)
    }

    async fn check_health(&self) -> anyhow::Result<()> {
        self.authorized(self.http.get(format!("{}/healthz", self.base_url)))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.secret {
            Some(secret) => request.bearer_auth(secret),
            None => request,
        }
    }
}

#[async_trait]
impl Servo for HttpServo {
    async fn move_to(&self, angle: u32) -> anyhow::Result<()> {
        let response = self
            .authorized(self.http.post(format!("{}/servo", self.base_url)))
            .json(&ServoMoveRequest { angle })
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("robot rejected move to {angle}: HTTP {status}"));
        }
        debug!(angle, "servo(http): moved");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
