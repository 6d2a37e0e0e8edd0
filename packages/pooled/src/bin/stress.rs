use pooled::{component, Registry, System, SystemBase};

#[derive(Debug, Default)]
pub struct Counter(i32);

component!(Counter);

pub struct CounterSystem {
    base: SystemBase,
}

impl CounterSystem {
    pub fn new() -> CounterSystem {
        let mut base = SystemBase::new();
        base.require_component::<Counter>();
        CounterSystem { base }
    }
}

impl System for CounterSystem {
    fn base(&self) -> &SystemBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SystemBase {
        &mut self.base
    }
}

fn main() {
    let mut registry = Registry::new();
    registry.add_system(CounterSystem::new());
    let mut to_kill = Vec::new();

    for _ in 0..8 {
        for entity in to_kill.drain(..) {
            registry.kill_entity(entity);
        }

        for idx in 0..512 {
            let entity = registry.create_entity();
            registry.add_component(entity, Counter(32));

            if idx % 12 == 11 {
                to_kill.push(entity);
            }
        }

        registry.update();
    }

    let members = registry
        .system::<CounterSystem>()
        .unwrap()
        .base()
        .entities()
        .len();

    println!("ids issued: {}", registry.num_entities());
    println!("members: {}", members);
}
