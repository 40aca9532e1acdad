use super::types::{GameEvent, WorldUpdate};
use crate::domain::systems::collision;
use crate::domain::{InputOutcome, PhysicsTuning, SessionRegistry, TickSnapshot};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{info, trace, warn};

/// Registry plus the fixed-step update order. Owned by exactly one task.
pub struct Simulation<R = StdRng> {
    registry: SessionRegistry,
    rng: R,
    tick: u64,
}

impl<R: Rng> Simulation<R> {
    pub fn new(tuning: PhysicsTuning, rng: R) -> Self {
        Self {
            registry: SessionRegistry::new(tuning),
            rng,
            tick: 0,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Applies one inbound event. Returns the roster to broadcast when membership changed.
    pub fn handle_event(&mut self, event: GameEvent) -> Option<WorldUpdate> {
        match event {
            GameEvent::Join { session_id } => {
                let entity = self.registry.register(session_id.clone(), &mut self.rng);
                let (x, y) = (entity.x, entity.y);
                info!(
                    %session_id,
                    x,
                    y,
                    players = self.registry.len(),
                    "player joined"
                );
                Some(WorldUpdate::Roster(self.registry.roster()))
            }
            GameEvent::Leave { session_id } => {
                let removed = self.registry.unregister(&session_id);
                info!(%session_id, removed, players = self.registry.len(), "player left");
                Some(WorldUpdate::Roster(self.registry.roster()))
            }
            GameEvent::Input {
                session_id,
                commands,
            } => {
                let outcome = self
                    .registry
                    .record_input(&session_id, &commands, &mut self.rng);
                if outcome == InputOutcome::Fabricated {
                    warn!(%session_id, "input for unknown session; created default entity");
                }
                None
            }
        }
    }

    /// Runs one tick: all collision responses first, then integration, then the snapshot.
    pub fn step(&mut self) -> TickSnapshot {
        let tuning = *self.registry.tuning();
        let entities = self.registry.entities_mut();

        let contacts = collision::resolve_collisions(entities, &tuning);
        for entity in entities.values_mut() {
            entity.integrate(&tuning);
        }

        self.tick += 1;
        trace!(tick = self.tick, contacts, "tick");
        self.registry.snapshot(self.tick)
    }
}

/// Tick period and physics constants for the world task.
#[derive(Debug, Clone)]
pub struct WorldSettings {
    /// Fixed tick period; the schedule does not drift with slow ticks.
    pub tick_interval: Duration,
    pub tuning: PhysicsTuning,
}

pub async fn world_task(
    mut input_rx: mpsc::Receiver<GameEvent>,
    world_tx: broadcast::Sender<WorldUpdate>,
    settings: WorldSettings,
    shutdown: Arc<Notify>,
) {
    let mut sim = Simulation::new(settings.tuning, StdRng::from_entropy());
    run_world(&mut sim, &mut input_rx, &world_tx, settings.tick_interval, &shutdown).await;
}

// Period-scheduled; overruns skip ticks instead of bursting to catch up.
fn tick_timer(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

// Events are applied between ticks, never during one.
async fn run_world<R: Rng>(
    sim: &mut Simulation<R>,
    input_rx: &mut mpsc::Receiver<GameEvent>,
    world_tx: &broadcast::Sender<WorldUpdate>,
    tick_interval: Duration,
    shutdown: &Notify,
) {
    let mut interval = tick_timer(tick_interval);

    loop {
        tokio::select! {
            biased;

            _ = shutdown.notified() => {
                info!(tick = sim.tick(), "world task shutting down");
                break;
            }
            _ = interval.tick() => {
                let snapshot = sim.step();
                // No receivers is fine: nobody is connected yet.
                let _ = world_tx.send(WorldUpdate::TickState(snapshot));
            }
            event = input_rx.recv() => {
                let Some(event) = event else {
                    info!("event channel closed; world task exiting");
                    break;
                };
                if let Some(update) = sim.handle_event(event) {
                    let _ = world_tx.send(update);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InputCommands, SessionId};

    fn sim() -> Simulation {
        Simulation::new(PhysicsTuning::default(), StdRng::seed_from_u64(3))
    }

    fn join(sim: &mut Simulation, id: &str) {
        sim.handle_event(GameEvent::Join {
            session_id: SessionId::from(id),
        });
    }

    fn place(sim: &mut Simulation, id: &str, x: f64, y: f64) {
        let e = sim
            .registry
            .entities_mut()
            .get_mut(&SessionId::from(id))
            .expect("entity should exist");
        e.x = x;
        e.y = y;
    }

    #[test]
    fn when_membership_changes_then_a_roster_is_produced() {
        let mut sim = sim();

        let joined = sim.handle_event(GameEvent::Join {
            session_id: SessionId::from("a"),
        });
        let Some(WorldUpdate::Roster(roster)) = joined else {
            panic!("join should produce a roster");
        };
        assert_eq!(roster.members.len(), 1);

        let input = sim.handle_event(GameEvent::Input {
            session_id: SessionId::from("a"),
            commands: InputCommands::default(),
        });
        assert!(input.is_none());

        let left = sim.handle_event(GameEvent::Leave {
            session_id: SessionId::from("a"),
        });
        let Some(WorldUpdate::Roster(roster)) = left else {
            panic!("leave should produce a roster");
        };
        assert!(roster.members.is_empty());
    }

    #[test]
    fn when_leave_repeats_then_an_identical_roster_is_produced_again() {
        let mut sim = sim();
        join(&mut sim, "a");
        join(&mut sim, "b");
        let leave = || GameEvent::Leave {
            session_id: SessionId::from("a"),
        };

        let Some(WorldUpdate::Roster(first)) = sim.handle_event(leave()) else {
            panic!("leave should produce a roster");
        };
        let Some(WorldUpdate::Roster(second)) = sim.handle_event(leave()) else {
            panic!("leave should produce a roster");
        };

        assert_eq!(first, second);
        assert_eq!(second.members.len(), 1);
    }

    #[test]
    fn when_input_arrives_for_unknown_session_then_no_roster_is_sent_but_it_is_simulated() {
        let mut sim = sim();

        let update = sim.handle_event(GameEvent::Input {
            session_id: SessionId::from("ghost"),
            commands: InputCommands {
                action: Some(true),
                ..Default::default()
            },
        });
        let snapshot = sim.step();

        assert!(update.is_none());
        assert!(snapshot.entities[&SessionId::from("ghost")].action);
    }

    #[test]
    fn when_two_entities_overlap_then_the_tick_pushes_them_apart_along_x() {
        let mut sim = sim();
        join(&mut sim, "a");
        join(&mut sim, "b");
        place(&mut sim, "a", 100.0, 100.0);
        place(&mut sim, "b", 105.0, 100.0);

        sim.step();

        let speed = sim.registry().tuning().speed;
        let damping = sim.registry().tuning().damping;
        let a = sim.registry().get(&SessionId::from("a")).expect("a");
        let b = sim.registry().get(&SessionId::from("b")).expect("b");
        // The push is applied, integrated, then damped within the same tick.
        assert!((a.x - (100.0 - speed)).abs() < 1e-9);
        assert!((b.x - (105.0 + speed)).abs() < 1e-9);
        assert!((a.vx + speed * damping).abs() < 1e-9);
        assert!((b.vx - speed * damping).abs() < 1e-9);
        assert!(a.vy.abs() < 1e-9 && b.vy.abs() < 1e-9);
    }

    #[test]
    fn when_input_is_held_then_it_keeps_applying_without_new_messages() {
        let mut sim = sim();
        join(&mut sim, "a");
        place(&mut sim, "a", 50.0, 240.0);
        sim.handle_event(GameEvent::Input {
            session_id: SessionId::from("a"),
            commands: InputCommands {
                right: Some(true),
                ..Default::default()
            },
        });

        let mut last_x = 50.0;
        for tick in 1..=10 {
            let snapshot = sim.step();
            assert_eq!(snapshot.tick, tick);
            let x = sim.registry().get(&SessionId::from("a")).expect("a").x;
            assert!(x > last_x);
            last_x = x;
        }
    }

    #[test]
    fn when_many_entities_tick_then_all_stay_in_bounds() {
        let mut sim = sim();
        for i in 0..12 {
            join(&mut sim, &format!("p{i}"));
        }
        // Pile everyone into one corner so collisions and walls interact.
        for i in 0..12 {
            place(&mut sim, &format!("p{i}"), 12.0 + i as f64, 12.0);
        }

        for _ in 0..200 {
            sim.step();
            let tuning = *sim.registry().tuning();
            for (_, e) in sim.registry.entities_mut().iter() {
                let (min_x, max_x) = tuning.x_bounds(e.radius);
                let (min_y, max_y) = tuning.y_bounds(e.radius);
                assert!((min_x..=max_x).contains(&e.x));
                assert!((min_y..=max_y).contains(&e.y));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn when_world_runs_then_join_broadcasts_roster_and_ticks_broadcast_state() {
        let (input_tx, mut input_rx) = mpsc::channel(16);
        let (world_tx, mut world_rx) = broadcast::channel(64);
        let shutdown = Arc::new(Notify::new());
        let mut sim = sim();

        let task_shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            run_world(
                &mut sim,
                &mut input_rx,
                &world_tx,
                Duration::from_millis(16),
                &task_shutdown,
            )
            .await;
            sim
        });

        input_tx
            .send(GameEvent::Join {
                session_id: SessionId::from("a"),
            })
            .await
            .expect("world task should accept events");

        let mut saw_roster = false;
        let mut ticks_with_entity = 0;
        while ticks_with_entity < 3 {
            match world_rx.recv().await.expect("world updates") {
                WorldUpdate::Roster(roster) => {
                    assert!(roster.members.contains_key(&SessionId::from("a")));
                    saw_roster = true;
                }
                WorldUpdate::TickState(snapshot) => {
                    if snapshot.entities.contains_key(&SessionId::from("a")) {
                        assert!(saw_roster, "roster must precede ticks that include the entity");
                        ticks_with_entity += 1;
                    }
                }
            }
        }

        shutdown.notify_one();
        let sim = handle.await.expect("world task should not panic");
        assert!(sim.tick() >= 3);
        assert_eq!(sim.registry().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn when_all_senders_drop_then_world_task_exits() {
        let (input_tx, input_rx) = mpsc::channel(16);
        let (world_tx, _world_rx) = broadcast::channel(16);
        let settings = WorldSettings {
            tick_interval: Duration::from_millis(16),
            tuning: PhysicsTuning::default(),
        };

        let handle = tokio::spawn(world_task(
            input_rx,
            world_tx,
            settings,
            Arc::new(Notify::new()),
        ));
        drop(input_tx);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("world task should exit")
            .expect("world task should not panic");
    }

    #[tokio::test(start_paused = true)]
    async fn when_world_runs_for_one_second_at_sixty_hz_then_sixty_tick_states_go_out() {
        let (_input_tx, mut input_rx) = mpsc::channel(16);
        let (world_tx, mut world_rx) = broadcast::channel(128);
        let shutdown = Arc::new(Notify::new());
        let mut sim = sim();
        let start = tokio::time::Instant::now();

        let task_shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            run_world(
                &mut sim,
                &mut input_rx,
                &world_tx,
                Duration::from_secs(1) / 60,
                &task_shutdown,
            )
            .await;
            sim
        });

        // The 61st tick is due at exactly one second.
        tokio::time::sleep_until(start + Duration::from_millis(999)).await;
        shutdown.notify_one();
        let sim = handle.await.expect("world task should not panic");

        let mut tick_states = Vec::new();
        while let Ok(update) = world_rx.try_recv() {
            if let WorldUpdate::TickState(snapshot) = update {
                tick_states.push(snapshot.tick);
            }
        }
        assert_eq!(tick_states, (1..=60).collect::<Vec<u64>>());
        assert_eq!(sim.tick(), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn when_a_tick_overruns_then_missed_ticks_are_skipped_not_burst() {
        let period = Duration::from_millis(20);
        let start = tokio::time::Instant::now();
        let mut timer = tick_timer(period);
        assert_eq!(timer.tick().await, start);

        // Stall for three and a half periods.
        tokio::time::advance(Duration::from_millis(70)).await;

        // One late tick fires right away for the oldest missed deadline.
        assert_eq!(timer.tick().await, start + Duration::from_millis(20));
        assert_eq!(tokio::time::Instant::now(), start + Duration::from_millis(70));

        // The 40ms and 60ms deadlines are dropped; the schedule resumes on the period grid.
        assert_eq!(timer.tick().await, start + Duration::from_millis(80));
        assert_eq!(tokio::time::Instant::now(), start + Duration::from_millis(80));
    }
}
