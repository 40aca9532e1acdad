use crate::domain::entity::Entity;
use crate::domain::session::SessionId;
use crate::domain::tuning::PhysicsTuning;
use std::collections::BTreeMap;

/// Velocity override produced by a contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
}

/// Response for `a` when it touches `b`, or `None` if they do not overlap.
///
/// The result replaces `a`'s velocity outright: a fixed-speed push directed away from `b`'s
/// center. Only `a` gets a response; call again with the arguments swapped for `b`.
/// Coincident centers resolve to an angle of zero, pushing `a` toward -x.
pub fn resolve(a: &Entity, b: &Entity, tuning: &PhysicsTuning) -> Option<Velocity> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let distance = dx.hypot(dy);

    if distance >= a.radius + b.radius {
        return None;
    }

    let angle = dy.atan2(dx);
    Some(Velocity {
        vx: -tuning.speed * angle.cos(),
        vy: -tuning.speed * angle.sin(),
    })
}

/// Evaluates every ordered pair against start-of-tick positions, then writes the responses.
///
/// Brute force O(n^2): fine for a handful of players, the first thing to replace if rooms grow.
/// When one entity touches several others the last response in iteration order wins.
/// Returns the number of responses applied.
pub fn resolve_collisions(
    entities: &mut BTreeMap<SessionId, Entity>,
    tuning: &PhysicsTuning,
) -> usize {
    let mut responses: Vec<(SessionId, Velocity)> = Vec::new();

    for (id, a) in entities.iter() {
        for (other_id, b) in entities.iter() {
            if id == other_id {
                continue;
            }
            if let Some(velocity) = resolve(a, b, tuning) {
                responses.push((id.clone(), velocity));
            }
        }
    }

    let applied = responses.len();
    for (id, velocity) in responses {
        if let Some(e) = entities.get_mut(&id) {
            e.vx = velocity.vx;
            e.vy = velocity.vy;
        }
    }
    applied
}
