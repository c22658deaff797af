use std::sync::Arc;

use async_trait::async_trait;
use shared::error::SourceError;

mod bridge;
mod link;

pub use bridge::{BridgeConnector, BridgeHandSource};
pub use link::{LinkError, MeetingLink};

/// Something that can report how many meeting participants have a hand up.
///
/// Polled repeatedly; treat every call as slow and possibly failing.
#[async_trait]
pub trait HandSignalSource: Send + Sync {
    /// Number of raised hands right now. A negative value is a contract
    /// violation that the caller rejects.
    async fn current_raised_hand_count(&self) -> Result<i64, SourceError>;

    /// Leave the meeting and drop the session. Called once, last.
    async fn release(&self) -> Result<(), SourceError> {
        Ok(())
    }
}

#[async_trait]
pub trait SignalSourceConnector: Send + Sync {
    async fn join(&self, link: &MeetingLink) -> Result<Arc<dyn HandSignalSource>, SourceError>;
}
