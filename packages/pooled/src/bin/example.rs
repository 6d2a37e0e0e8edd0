use pooled::{component, Registry, System, SystemBase};

#[derive(Debug, Default)]
pub struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Default)]
pub struct Velocity {
    x: f32,
    y: f32,
}

component!(Position);
component!(Velocity);

pub struct MovementSystem {
    base: SystemBase,
}

impl MovementSystem {
    pub fn new() -> MovementSystem {
        let mut base = SystemBase::new();
        base.require_component::<Position>();
        base.require_component::<Velocity>();
        MovementSystem { base }
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

fn run_movement(registry: &mut Registry, delta_time: f32) {
    let entities = registry
        .system::<MovementSystem>()
        .unwrap()
        .base()
        .entities()
        .to_vec();

    for entity in entities {
        let velocity = registry.component::<Velocity>(entity).unwrap();
        let (dx, dy) = (velocity.x, velocity.y);

        let position = registry.component_mut::<Position>(entity).unwrap();
        position.x += dx * delta_time;
        position.y += dy * delta_time;
    }
}

fn main() {
    let mut registry = Registry::new();
    registry.add_system(MovementSystem::new());

    let entity = registry.create_entity();
    registry.add_component(entity, Position { x: 0.0, y: 0.0 });
    registry.add_component(entity, Velocity { x: 5.0, y: 5.0 });

    registry.update();
    run_movement(&mut registry, 1.0);

    println!("entity: {:?}", entity);
    println!("position: {:?}", registry.component::<Position>(entity).unwrap());
    println!("velocity: {:?}", registry.component::<Velocity>(entity).unwrap());
}
