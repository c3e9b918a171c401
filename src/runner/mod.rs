//! Activation orchestration.

pub mod guard;
pub mod session;

pub use guard::{InFlightGuard, InFlightSlot};
pub use session::{ActivationOutcome, ActivationSession};
