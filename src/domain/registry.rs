// Authoritative mapping of session identity to entity.

use super::entity::{Entity, InputCommands};
use super::session::SessionId;
use super::state::{EntitySnapshot, Roster, RosterEntry, TickSnapshot};
use super::tuning::PhysicsTuning;
use rand::Rng;
use std::collections::BTreeMap;

/// What `record_input` had to do to apply a command batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// The session was registered; its flags were merged.
    Applied,
    /// The session was unknown, so a default entity was created first.
    Fabricated,
}

/// Owns entity lifetime. Insert and remove are the only structural mutations.
#[derive(Debug)]
pub struct SessionRegistry {
    tuning: PhysicsTuning,
    entities: BTreeMap<SessionId, Entity>,
}

impl SessionRegistry {
    pub fn new(tuning: PhysicsTuning) -> Self {
        Self {
            tuning,
            entities: BTreeMap::new(),
        }
    }

    /// Spawns a fresh entity for `session_id`, replacing any existing entry.
    pub fn register<R: Rng + ?Sized>(&mut self, session_id: SessionId, rng: &mut R) -> &Entity {
        let entity = Entity::spawn(rng, &self.tuning);
        self.entities.insert(session_id.clone(), entity);
        &self.entities[&session_id]
    }

    /// Removes the entity if present. Returns false when it was already gone.
    pub fn unregister(&mut self, session_id: &SessionId) -> bool {
        self.entities.remove(session_id).is_some()
    }

    /// Merges a command batch into the session's input flags.
    ///
    /// Input for an unknown session (never joined, or already left) creates an entity with
    /// the same defaults `register` uses. Membership broadcasts are the caller's concern.
    pub fn record_input<R: Rng + ?Sized>(
        &mut self,
        session_id: &SessionId,
        commands: &InputCommands,
        rng: &mut R,
    ) -> InputOutcome {
        if let Some(entity) = self.entities.get_mut(session_id) {
            entity.apply_input(commands);
            return InputOutcome::Applied;
        }

        let mut entity = Entity::spawn(rng, &self.tuning);
        entity.apply_input(commands);
        self.entities.insert(session_id.clone(), entity);
        InputOutcome::Fabricated
    }

    pub fn get(&self, session_id: &SessionId) -> Option<&Entity> {
        self.entities.get(session_id)
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.entities.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn tuning(&self) -> &PhysicsTuning {
        &self.tuning
    }

    pub fn roster(&self) -> Roster {
        let members = self
            .entities
            .iter()
            .map(|(id, e)| {
                let entry = RosterEntry {
                    x: self.tuning.round_position(e.x),
                    y: self.tuning.round_position(e.y),
                };
                (id.clone(), entry)
            })
            .collect();
        Roster { members }
    }

    pub fn snapshot(&self, tick: u64) -> TickSnapshot {
        let entities = self
            .entities
            .iter()
            .map(|(id, e)| {
                let snapshot = EntitySnapshot {
                    x: self.tuning.round_position(e.x),
                    y: self.tuning.round_position(e.y),
                    action: e.input.action,
                };
                (id.clone(), snapshot)
            })
            .collect();
        TickSnapshot { tick, entities }
    }

    // Physics steps only; lifetime changes go through register/unregister.
    pub(crate) fn entities_mut(&mut self) -> &mut BTreeMap<SessionId, Entity> {
        &mut self.entities
    }
}
