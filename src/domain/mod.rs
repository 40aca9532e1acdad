// Domain layer: core simulation types and rules.

pub mod entity;
pub mod registry;
pub mod session;
pub mod state;
pub mod systems;
pub mod tuning;

pub use entity::{Entity, InputCommands, InputFlags};
pub use registry::{InputOutcome, SessionRegistry};
pub use session::SessionId;
pub use state::{EntitySnapshot, Roster, RosterEntry, TickSnapshot};
pub use tuning::PhysicsTuning;
