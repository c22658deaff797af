//! Turns a polled raised-hand count into moves of a physical hand.
//!
//! [`AudienceCoordinator`] holds the hand's state and decides which command,
//! if any, each input warrants. [`DriveLoop`] owns the cadence: it polls the
//! meeting, feeds the coordinator, and lowers the hand on every exit path.

mod coordinator;
mod drive_loop;
mod session;

pub use coordinator::{AudienceCoordinator, CoordinatorError, WiggleSettings, WiggleState};
pub use drive_loop::{DriveError, DriveLoop, DriveSettings, StopReason};
pub use session::{run_session, SessionConfig};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
