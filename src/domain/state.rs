// Read-only projections of the registry handed to the protocol layer.

use super::session::SessionId;
use std::collections::BTreeMap;

/// Position of one member in a roster broadcast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RosterEntry {
    pub x: f64,
    pub y: f64,
}

/// Every registered session, produced whenever membership changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    pub members: BTreeMap<SessionId, RosterEntry>,
}

/// Per-tick view of one entity. Positions are already rounded for the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntitySnapshot {
    pub x: f64,
    pub y: f64,
    pub action: bool,
}

/// Post-integration state of every entity for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSnapshot {
    pub tick: u64,
    pub entities: BTreeMap<SessionId, EntitySnapshot>,
}
