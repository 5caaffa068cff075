//! The Simulation Controller layer: scheduling, conflict resolution, and the
//! step-event bus built on top of the behavior layer.

pub mod conflict;
pub mod controller;
pub mod event;

pub use conflict::Candidate;
pub use conflict::ConflictPolicy;
pub use controller::Controller;
pub use controller::State;
pub use event::ListenerId;
pub use event::StepEvent;
