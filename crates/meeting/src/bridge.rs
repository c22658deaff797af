//! Client for the participant bridge: a sidecar that keeps a browser
//! session in the meeting and scrapes its participants list.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    error::SourceError,
    protocol::{JoinSessionRequest, JoinSessionResponse, RaisedHandsReport},
};
use tracing::{debug, info, warn};

use crate::{HandSignalSource, MeetingLink, SignalSourceConnector};

const POLL_TIMEOUT: Duration = Duration::from_secs(10);
// Joining waits on the bridge's browser to load the meeting and log in.
const JOIN_TIMEOUT: Duration = Duration::from_secs(60);

pub struct BridgeConnector {
    http: Client,
    base_url: String,
    display_name: String,
}

impl BridgeConnector {
    pub fn new(base_url: &str, display_name: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            display_name: display_name.into(),
        }
    }
}

#[async_trait]
impl SignalSourceConnector for BridgeConnector {
    async fn join(&self, link: &MeetingLink) -> Result<Arc<dyn HandSignalSource>, SourceError> {
        debug!(join_url = %link, "bridge: joining meeting");
        let response = self
            .http
            .post(format!("{}/sessions", self.base_url))
            .timeout(JOIN_TIMEOUT)
            .json(&JoinSessionRequest {
                join_url: link.join_url().to_string(),
                display_name: self.display_name.clone(),
            })
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| SourceError::fatal(format!("failed to join meeting: {err}")))?;
        let joined: JoinSessionResponse = response
            .json()
            .await
            .map_err(|err| SourceError::fatal(format!("malformed join response: {err}")))?;

        info!(
            meeting_id = link.meeting_id(),
            session_id = %joined.session_id,
            "bridge: joined meeting"
        );
        Ok(Arc::new(BridgeHandSource {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            session_id: joined.session_id,
            meeting_ended: AtomicBool::new(false),
        }))
    }
}

pub struct BridgeHandSource {
    http: Client,
    base_url: String,
    session_id: String,
    meeting_ended: AtomicBool,
}

impl BridgeHandSource {
    fn session_url(&self) -> String {
        format!("{}/sessions/{}", self.base_url, self.session_id)
    }
}

fn classify_request_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() || err.is_connect() {
        return SourceError::transient(err.to_string());
    }
    match err.status() {
        Some(status) => classify_status(status),
        None => SourceError::transient(err.to_string()),
    }
}

fn classify_status(status: StatusCode) -> SourceError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => {
            SourceError::fatal(format!("bridge session lost: HTTP {status}"))
        }
        status if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
            SourceError::transient(format!("bridge unavailable: HTTP {status}"))
        }
        status => SourceError::fatal(format!("bridge rejected poll: HTTP {status}")),
    }
}

#[async_trait]
impl HandSignalSource for BridgeHandSource {
    async fn current_raised_hand_count(&self) -> Result<i64, SourceError> {
        let response = self
            .http
            .get(format!("{}/raised_hands", self.session_url()))
            .timeout(POLL_TIMEOUT)
            .send()
            .await
            .map_err(classify_request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }
        let report: RaisedHandsReport = response
            .json()
            .await
            .map_err(|err| SourceError::transient(format!("malformed report: {err}")))?;

        if report.meeting_ended {
            self.meeting_ended.store(true, Ordering::SeqCst);
            return Err(SourceError::MeetingEnded);
        }
        Ok(report.raised_hands)
    }

    async fn release(&self) -> Result<(), SourceError> {
        if self.meeting_ended.load(Ordering::SeqCst) {
            // Nothing to leave; the bridge tears the session down itself.
            return Ok(());
        }
        let response = self
            .http
            .delete(self.session_url())
            .timeout(POLL_TIMEOUT)
            .send()
            .await
            .map_err(classify_request_error)?;
        if !response.status().is_success() {
            warn!(
                session_id = %self.session_id,
                status = %response.status(),
                "bridge: leave request rejected"
            );
            return Err(classify_status(response.status()));
        }
        info!(session_id = %self.session_id, "bridge: left meeting");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/bridge_tests.rs"]
mod tests;
