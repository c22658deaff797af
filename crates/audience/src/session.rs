use std::{future::Future, time::Duration};

use meeting::{MeetingLink, SignalSourceConnector};
use robot::ActuatorConnector;
use tracing::{debug, info, warn};

use crate::{
    coordinator::WiggleSettings,
    drive_loop::{DriveError, DriveLoop, DriveSettings, StopReason},
};

/// How long an interrupted join may still finish so the meeting can be left.
const JOIN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub wiggle: WiggleSettings,
    pub drive: DriveSettings,
}

/// Join the meeting, connect the hand, and drive it until `shutdown`.
///
/// The source is joined first and released last; if the actuator cannot be
/// reached the source is released before returning. An interrupt while
/// joining stops without touching the hand; a join that still completes
/// shortly afterwards is released.
pub async fn run_session<F>(
    link: &MeetingLink,
    sources: &dyn SignalSourceConnector,
    actuators: &dyn ActuatorConnector,
    config: SessionConfig,
    shutdown: F,
) -> Result<StopReason, DriveError>
where
    F: Future<Output = ()>,
{
    let mut shutdown = std::pin::pin!(shutdown);
    let mut join = std::pin::pin!(sources.join(link));

    let joined = tokio::select! {
        biased;
        _ = &mut shutdown => None,
        joined = &mut join => Some(joined),
    };
    let source = match joined {
        Some(joined) => joined.map_err(DriveError::Source)?,
        None => {
            info!("session: interrupted while joining");
            // A join already admitted by the bridge must still be left.
            match tokio::time::timeout(JOIN_GRACE, join).await {
                Ok(Ok(source)) => {
                    if let Err(err) = source.release().await {
                        warn!(error = %err, "session: failed to leave meeting");
                    }
                }
                Ok(Err(err)) => debug!(error = %err, "session: join failed after interrupt"),
                Err(_) => warn!("session: join still pending, abandoning it"),
            }
            return Ok(StopReason::Interrupted);
        }
    };

    let actuator = match actuators.connect().await {
        Ok(actuator) => actuator,
        Err(err) => {
            if let Err(release_err) = source.release().await {
                warn!(error = %release_err, "session: failed to leave meeting");
            }
            return Err(DriveError::Connect(err));
        }
    };

    info!(meeting_id = link.meeting_id(), "session: watching for raised hands");
    DriveLoop::new(source, actuator, config.wiggle, config.drive)
        .run(shutdown)
        .await
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
