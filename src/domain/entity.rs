// Per-player physical state and the command-driven motion law.

use super::tuning::PhysicsTuning;
use rand::Rng;

/// Held direction/action flags. They persist between ticks until a new command changes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFlags {
    pub left: bool,
    pub up: bool,
    pub right: bool,
    pub down: bool,
    pub action: bool,
}

/// A partial command batch. `None` leaves the matching flag untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputCommands {
    pub left: Option<bool>,
    pub up: Option<bool>,
    pub right: Option<bool>,
    pub down: Option<bool>,
    pub action: Option<bool>,
}

impl InputFlags {
    pub fn merge(&mut self, commands: &InputCommands) {
        let InputCommands {
            left,
            up,
            right,
            down,
            action,
        } = *commands;

        if let Some(v) = left {
            self.left = v;
        }
        if let Some(v) = up {
            self.up = v;
        }
        if let Some(v) = right {
            self.right = v;
        }
        if let Some(v) = down {
            self.down = v;
        }
        if let Some(v) = action {
            self.action = v;
        }
    }
}

/// Authoritative state for one connected player.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub input: InputFlags,
}

impl Entity {
    /// At rest with no input held.
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            radius,
            input: InputFlags::default(),
        }
    }

    /// Uniformly random in-bounds position with the default radius.
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, tuning: &PhysicsTuning) -> Self {
        let radius = tuning.default_radius;
        let (min_x, max_x) = tuning.x_bounds(radius);
        let (min_y, max_y) = tuning.y_bounds(radius);
        let x = rng.gen_range(min_x..=max_x);
        let y = rng.gen_range(min_y..=max_y);
        Self::new(x, y, radius)
    }

    pub fn apply_input(&mut self, commands: &InputCommands) {
        self.input.merge(commands);
    }

    /// Advances this entity by one tick. Runs after the tick's collision responses.
    ///
    /// Clamping to the arena does not touch velocity: an entity pinned against a wall
    /// keeps pushing into it until input reverses or damping wins.
    pub fn integrate(&mut self, tuning: &PhysicsTuning) {
        // Left wins over right, up wins over down.
        if self.input.left {
            self.vx -= tuning.speed;
        } else if self.input.right {
            self.vx += tuning.speed;
        }
        if self.input.up {
            self.vy -= tuning.speed;
        } else if self.input.down {
            self.vy += tuning.speed;
        }

        self.x += self.vx;
        self.y += self.vy;

        let (min_x, max_x) = tuning.x_bounds(self.radius);
        let (min_y, max_y) = tuning.y_bounds(self.radius);
        self.x = self.x.clamp(min_x, max_x);
        self.y = self.y.clamp(min_y, max_y);

        self.vx *= tuning.damping;
        self.vy *= tuning.damping;
    }

    #[cfg(test)]
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }
}
