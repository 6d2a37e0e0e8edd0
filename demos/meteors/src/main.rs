//! A headless shower of meteors.
//!
//! Spawns a population of drifting meteors, integrates their motion each
//! tick and expires them when their fuse runs out, demonstrating the
//! deferred create/kill flush from a plain simulation loop.

use rand::Rng;
use tracing::info;

use pooled::{component, Entity, Registry, System, SystemBase};

const TICKS: u32 = 60;
const SPAWN_PER_TICK: u32 = 4;
const TIME_STEP: f64 = 1.0 / 30.0;

#[derive(Debug, Default)]
pub struct Transform {
    x: f64,
    y: f64,
}

#[derive(Debug, Default)]
pub struct Velocity {
    x: f64,
    y: f64,
}

#[derive(Debug, Default)]
pub struct Fuse {
    remaining: f64,
}

component!(Transform);
component!(Velocity);
component!(Fuse);

pub struct MovementSystem {
    base: SystemBase,
}

impl MovementSystem {
    pub fn new() -> MovementSystem {
        let mut base = SystemBase::new();
        base.require_component::<Transform>();
        base.require_component::<Velocity>();
        MovementSystem { base }
    }

    pub fn run(registry: &mut Registry, delta_time: f64) {
        let entities = members::<MovementSystem>(registry);

        for entity in entities {
            let velocity = registry.component::<Velocity>(entity).unwrap();
            let (dx, dy) = (velocity.x, velocity.y);

            let transform = registry.component_mut::<Transform>(entity).unwrap();
            transform.x += dx * delta_time;
            transform.y += dy * delta_time;
        }
    }
}

impl System for MovementSystem {
    fn base(&self) -> &SystemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SystemBase {
        &mut self.base
    }
}

pub struct ExpirySystem {
    base: SystemBase,
}

impl ExpirySystem {
    pub fn new() -> ExpirySystem {
        let mut base = SystemBase::new();
        base.require_component::<Fuse>();
        ExpirySystem { base }
    }

    /// Burn each fuse down and stage burned-out meteors for the next flush.
    pub fn run(registry: &mut Registry, delta_time: f64) {
        let entities = members::<ExpirySystem>(registry);

        for entity in entities {
            let fuse = registry.component_mut::<Fuse>(entity).unwrap();
            fuse.remaining -= delta_time;

            if fuse.remaining <= 0.0 {
                registry.kill_entity(entity);
            }
        }
    }
}

impl System for ExpirySystem {
    fn base(&self) -> &SystemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SystemBase {
        &mut self.base
    }
}

fn members<S: System>(registry: &Registry) -> Vec<Entity> {
    registry
        .system::<S>()
        .map(|system| system.base().entities().to_vec())
        .unwrap_or_default()
}

fn spawn_meteor(registry: &mut Registry, rng: &mut impl Rng) {
    let entity = registry.create_entity();
    registry.add_component(entity, Transform { x: 0.0, y: 0.0 });
    registry.add_component(
        entity,
        Velocity {
            x: rng.gen_range(-40.0..40.0),
            y: rng.gen_range(10.0..80.0),
        },
    );
    registry.add_component(
        entity,
        Fuse {
            remaining: rng.gen_range(0.2..1.5),
        },
    );
}

fn init_telemetry() {
    use tracing_subscriber::{fmt, EnvFilter, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

fn main() {
    init_telemetry();

    let mut registry = Registry::new();
    registry.add_system(MovementSystem::new());
    registry.add_system(ExpirySystem::new());

    let mut rng = rand::thread_rng();

    for tick in 0..TICKS {
        for _ in 0..SPAWN_PER_TICK {
            spawn_meteor(&mut registry, &mut rng);
        }

        registry.update();

        MovementSystem::run(&mut registry, TIME_STEP);
        ExpirySystem::run(&mut registry, TIME_STEP);

        let alive = members::<ExpirySystem>(&registry).len();
        info!(tick, alive, "tick complete");
    }

    let survivors = members::<MovementSystem>(&registry);
    info!(count = survivors.len(), "simulation finished");

    for entity in survivors.iter().take(8) {
        let transform = registry.component::<Transform>(*entity).unwrap();
        info!(id = entity.id(), x = transform.x, y = transform.y, "survivor");
    }
}
