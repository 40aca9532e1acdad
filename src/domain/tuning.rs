/// Gameplay tuning for the shared arena simulation.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).
/// The arena is not configurable at runtime; tests build alternate tunings directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsTuning {
    /// Velocity added per tick while a direction is held. Also the push-away speed on contact.
    pub speed: f64,

    /// Per-tick geometric velocity decay (friction).
    pub damping: f64,

    /// Arena extent in world units; positions are clamped inside it.
    pub arena_width: f64,
    pub arena_height: f64,

    /// Radius given to every newly created entity.
    pub default_radius: f64,

    /// Decimal places kept for positions in outbound messages.
    pub position_decimals: u32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            speed: 1.5,
            damping: 0.75,
            arena_width: 640.0,
            arena_height: 480.0,
            default_radius: 10.0,
            position_decimals: 2,
        }
    }
}

impl PhysicsTuning {
    /// Allowed `(min, max)` for an entity center along x.
    pub fn x_bounds(&self, radius: f64) -> (f64, f64) {
        axis_bounds(self.arena_width, radius)
    }

    /// Allowed `(min, max)` for an entity center along y.
    pub fn y_bounds(&self, radius: f64) -> (f64, f64) {
        axis_bounds(self.arena_height, radius)
    }

    /// Rounds a coordinate to the outbound precision.
    pub fn round_position(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.position_decimals as i32);
        (value * scale).round() / scale
    }

    /// Velocity approached while one direction is held with no collisions.
    #[cfg(test)]
    pub fn terminal_speed(&self) -> f64 {
        self.speed * self.damping / (1.0 - self.damping)
    }
}

// An entity wider than the arena is pinned to `min` instead of producing an inverted range.
fn axis_bounds(extent: f64, radius: f64) -> (f64, f64) {
    let min = radius;
    let max = (extent - radius).max(min);
    (min, max)
}
