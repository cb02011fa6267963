//! The release pipeline: gate, trigger, poll, and the orchestrator tying
//! them together
//!
//! Each stage talks to the outside world only through the [crate::git::Repository]
//! and [crate::ci::CiClient] traits and a [clock::Clock], so the whole flow
//! runs against mocks in tests.

pub mod clock;
pub mod gate;
pub mod orchestrator;
pub mod poller;
pub mod trigger;

pub use clock::{Clock, Interrupt, ManualClock, SystemClock};
pub use gate::{GateError, GateFailure, ReleaseGate};
pub use orchestrator::{
    Interaction, ReleaseOrchestrator, ReleaseOutcome, ReleaseReport, ReleaseRequest,
};
pub use poller::{PollEvent, PollOutcome, PollReport, PollState, ReleasePoller};
pub use trigger::{ReleaseTrigger, RunHandle};
