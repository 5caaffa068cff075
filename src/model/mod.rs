//! The Marking Model: places, transitions, arcs, IDs, and the owning arena
//! (`Net`) that holds them. No simulation logic lives here; behaviors and the
//! controller consume `Net` through read/mutate calls.

pub mod arc;
pub mod id;
pub mod loader;
pub mod marking;
pub mod net;
pub mod place;
pub mod transition;

pub use arc::Arc;
pub use arc::ArcKind;
pub use arc::Endpoint;
pub use id::ArcId;
pub use id::PlaceId;
pub use id::TransitionId;
pub use marking::Marking;
pub use net::Net;
pub use place::Place;
pub use transition::Transition;
pub use transition::TransitionKind;
