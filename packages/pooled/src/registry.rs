//! The registry which coordinates entities, components and systems.
//!
//! The registry owns every pool, every entity signature, every system and
//! the two pending sets. Entity creation and destruction are deferred: both
//! are staged and only become visible to systems when `update` flushes them,
//! once per simulation tick. Component attachment is immediate; only system
//! membership is deferred.

use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap};

use crossbeam_queue::SegQueue;
use tracing::{debug, trace};

use crate::component::Component;
use crate::entity::Entity;
use crate::error::ComponentError;
use crate::pool::{AnyPool, Pool};
use crate::signature::Signature;
use crate::system::System;

/// The central coordinator of the ECS.
///
/// The registry is the sole owner of all entity state; `Entity` handles are
/// plain ids and every operation on them is a method here. Structural
/// mutation takes `&mut self`, so one tick's worth of staged changes can
/// never interleave with iteration over system membership lists.
pub struct Registry {
    /// High-water count of issued entity ids, including recycled ones.
    num_entities: u32,
    /// One pool slot per component type id; filled lazily on first attach.
    pools: Vec<Option<Box<dyn AnyPool>>>,
    /// One signature per issued entity id.
    signatures: Vec<Signature>,
    /// One system instance per concrete system type.
    systems: HashMap<TypeId, Box<dyn System>>,
    /// Entities staged for insertion into system membership lists.
    to_be_added: BTreeSet<Entity>,
    /// Entities staged for removal and id recycling.
    to_be_killed: BTreeSet<Entity>,
    /// Previously killed ids, reused oldest-first.
    free_ids: SegQueue<u32>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Registry {
        Registry {
            num_entities: 0,
            pools: Vec::new(),
            signatures: Vec::new(),
            systems: HashMap::new(),
            to_be_added: BTreeSet::new(),
            to_be_killed: BTreeSet::new(),
            free_ids: SegQueue::new(),
        }
    }

    /// Return the number of entity ids issued so far.
    ///
    /// This is a high-water mark, not a live count: it does not decrease
    /// when entities are killed, and recycled ids are not counted twice.
    pub fn num_entities(&self) -> u32 {
        self.num_entities
    }

    /// Create a new entity and stage it for the next flush.
    ///
    /// The oldest freed id is reused if one is available; otherwise a fresh
    /// id is allocated and the signature table grows to cover it. The
    /// returned handle accepts components immediately, but the entity joins
    /// system membership lists only at the next `update`.
    pub fn create_entity(&mut self) -> Entity {
        let id = match self.free_ids.pop() {
            Some(id) => id,
            None => {
                let id = self.num_entities;
                self.num_entities += 1;

                if id as usize >= self.signatures.len() {
                    self.signatures.resize_with(id as usize + 1, Signature::new);
                }

                id
            }
        };

        let entity = Entity::new(id);
        self.to_be_added.insert(entity);

        debug!(id, "created entity");
        entity
    }

    /// Stage an entity for destruction at the next flush.
    ///
    /// No immediate effect: components stay attached and system membership
    /// is untouched until `update` runs. Kills are deduplicated within a
    /// tick; killing a handle whose id has already been recycled is a
    /// contract violation.
    ///
    /// Panics if `entity` was not issued by this registry.
    pub fn kill_entity(&mut self, entity: Entity) {
        assert!(
            (entity.id() as usize) < self.signatures.len(),
            "{:?} was not issued by this registry",
            entity
        );

        self.to_be_killed.insert(entity);
        debug!(id = entity.id(), "killed entity");
    }

    /// Flush staged entity changes into system membership lists.
    ///
    /// Staged creations are processed before staged kills: an entity
    /// created and killed within the same tick is added to matching systems
    /// and then immediately removed, never observable in between. Each
    /// pending set is taken exactly once per call, so flushing twice cannot
    /// double-add.
    pub fn update(&mut self) {
        let added = std::mem::take(&mut self.to_be_added);
        for entity in added {
            self.add_entity_to_systems(entity);
        }

        let killed = std::mem::take(&mut self.to_be_killed);
        for entity in killed {
            self.remove_entity_from_systems(entity);
            self.signatures[entity.id() as usize].clear();
            self.free_ids.push(entity.id());
            trace!(id = entity.id(), "recycled entity id");
        }
    }

    /// Append `entity` to every system whose required signature it
    /// satisfies.
    fn add_entity_to_systems(&mut self, entity: Entity) {
        let signature = &self.signatures[entity.id() as usize];

        for system in self.systems.values_mut() {
            if signature.includes_all(system.base().signature()) {
                system.base_mut().add_entity(entity);
            }
        }
    }

    /// Remove `entity` from every system's membership list.
    fn remove_entity_from_systems(&mut self, entity: Entity) {
        for system in self.systems.values_mut() {
            system.base_mut().remove_entity(entity);
        }
    }

    /// Attach a component to an entity, replacing any previous value.
    ///
    /// The pool for `T` is created on first use and grown to cover every
    /// issued entity id. The signature bit is set immediately, but system
    /// membership is not re-evaluated here; entities staged for creation
    /// join systems at the next `update`.
    ///
    /// Panics if `entity` was not issued by this registry.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) {
        let type_id = T::type_id();
        let index = entity.id() as usize;

        assert!(
            index < self.signatures.len(),
            "{:?} was not issued by this registry",
            entity
        );

        if type_id.id() >= self.pools.len() {
            self.pools.resize_with(type_id.id() + 1, || None);
        }

        let pool = self.pools[type_id.id()].get_or_insert_with(|| Box::new(Pool::<T>::new()));
        if index >= pool.len() {
            pool.resize(self.num_entities as usize);
        }

        let any: &mut dyn Any = pool.as_mut();
        let pool = any.downcast_mut::<Pool<T>>().unwrap();
        pool.set(index, component);

        self.signatures[index].insert(type_id);
        trace!(id = entity.id(), component = type_id.name(), "added component");
    }

    /// Detach a component from an entity.
    ///
    /// Only the signature bit is cleared; the pool slot keeps its last
    /// value and is treated as absent. Systems already holding the entity
    /// keep it in their membership lists.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) {
        let type_id = T::type_id();

        if let Some(signature) = self.signatures.get_mut(entity.id() as usize) {
            signature.remove(type_id);
            trace!(id = entity.id(), component = type_id.name(), "removed component");
        }
    }

    /// Returns true if `entity` currently has a `T` attached.
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.signatures
            .get(entity.id() as usize)
            .map_or(false, |signature| signature.includes(T::type_id()))
    }

    /// Fetch the `T` attached to `entity`.
    pub fn component<T: Component>(&self, entity: Entity) -> Result<&T, ComponentError> {
        let type_id = T::type_id();
        let missing = || ComponentError::Missing {
            entity,
            component: type_id.name(),
        };

        let signature = self
            .signatures
            .get(entity.id() as usize)
            .ok_or(ComponentError::OutOfRange { entity })?;
        if !signature.includes(type_id) {
            return Err(missing());
        }

        let pool = self
            .pools
            .get(type_id.id())
            .and_then(Option::as_ref)
            .ok_or_else(missing)?;
        let any: &dyn Any = pool.as_ref();
        let pool = any.downcast_ref::<Pool<T>>().unwrap();

        pool.get(entity.id() as usize).ok_or_else(missing)
    }

    /// Fetch the `T` attached to `entity` mutably.
    pub fn component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, ComponentError> {
        let type_id = T::type_id();
        let missing = || ComponentError::Missing {
            entity,
            component: type_id.name(),
        };

        let signature = self
            .signatures
            .get(entity.id() as usize)
            .ok_or(ComponentError::OutOfRange { entity })?;
        if !signature.includes(type_id) {
            return Err(missing());
        }

        let pool = self
            .pools
            .get_mut(type_id.id())
            .and_then(Option::as_mut)
            .ok_or_else(missing)?;
        let any: &mut dyn Any = pool.as_mut();
        let pool = any.downcast_mut::<Pool<T>>().unwrap();

        pool.get_mut(entity.id() as usize).ok_or_else(missing)
    }

    /// Register a system instance, keyed by its concrete type.
    ///
    /// At most one instance per type; registering again replaces the
    /// previous instance along with its membership list. Entities already
    /// live are not retroactively evaluated; membership is only computed
    /// for staged entities during `update`.
    pub fn add_system<S: System>(&mut self, system: S) {
        self.systems.insert(TypeId::of::<S>(), Box::new(system));
    }

    /// Remove the registered `S` instance, if any.
    pub fn remove_system<S: System>(&mut self) {
        self.systems.remove(&TypeId::of::<S>());
    }

    /// Returns true if an `S` instance is registered.
    pub fn has_system<S: System>(&self) -> bool {
        self.systems.contains_key(&TypeId::of::<S>())
    }

    /// Borrow the registered `S` instance.
    pub fn system<S: System>(&self) -> Option<&S> {
        self.systems.get(&TypeId::of::<S>()).and_then(|system| {
            let any: &dyn Any = system.as_ref();
            any.downcast_ref()
        })
    }

    /// Borrow the registered `S` instance mutably.
    pub fn system_mut<S: System>(&mut self) -> Option<&mut S> {
        self.systems.get_mut(&TypeId::of::<S>()).and_then(|system| {
            let any: &mut dyn Any = system.as_mut();
            any.downcast_mut()
        })
    }
}

impl Default for Registry {
    fn default() -> Registry {
        Registry::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::system::SystemBase;

    #[derive(Debug, Default, PartialEq)]
    struct Position {
        x: f64,
        y: f64,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Velocity {
        x: f64,
        y: f64,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Health(u32);

    crate::component!(Position);
    crate::component!(Velocity);
    crate::component!(Health);

    struct MovementSystem {
        base: SystemBase,
    }

    impl MovementSystem {
        fn new() -> MovementSystem {
            let mut base = SystemBase::new();
            base.require_component::<Position>();
            base.require_component::<Velocity>();
            MovementSystem { base }
        }

        fn update(registry: &mut Registry, delta_time: f64) {
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
    }

    impl System for MovementSystem {
        fn base(&self) -> &SystemBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut SystemBase {
            &mut self.base
        }
    }

    fn movement_entities(registry: &Registry) -> Vec<Entity> {
        registry
            .system::<MovementSystem>()
            .unwrap()
            .base()
            .entities()
            .to_vec()
    }

    #[test]
    fn test_ids_are_sequential_then_recycled_fifo() {
        let mut registry = Registry::new();
        let entities: Vec<Entity> = (0..8).map(|_| registry.create_entity()).collect();
        registry.update();

        let ids: Vec<u32> = entities.iter().map(Entity::id).collect();
        assert_eq!(ids, (0..8).collect::<Vec<u32>>());

        registry.kill_entity(entities[3]);
        registry.kill_entity(entities[7]);
        registry.update();

        // Oldest freed id first, then the next.
        assert_eq!(registry.create_entity().id(), 3);
        assert_eq!(registry.create_entity().id(), 7);

        // No higher-water ids were consumed by the reuse.
        assert_eq!(registry.create_entity().id(), 8);
        assert_eq!(registry.num_entities(), 9);
    }

    #[test]
    fn test_membership_needs_full_signature_and_a_flush() {
        let mut registry = Registry::new();
        registry.add_system(MovementSystem::new());

        let partial = registry.create_entity();
        registry.add_component(partial, Position { x: 0.0, y: 0.0 });

        let full = registry.create_entity();
        registry.add_component(full, Position { x: 0.0, y: 0.0 });
        registry.add_component(full, Velocity { x: 1.0, y: 1.0 });

        // Nothing is visible before the flush, regardless of call order.
        assert!(movement_entities(&registry).is_empty());

        registry.update();
        assert_eq!(movement_entities(&registry), vec![full]);
    }

    #[test]
    fn test_add_then_kill_same_tick_nets_to_removed() {
        let mut registry = Registry::new();
        registry.add_system(MovementSystem::new());

        let entity = registry.create_entity();
        registry.add_component(entity, Position::default());
        registry.add_component(entity, Velocity::default());
        registry.kill_entity(entity);

        registry.update();
        assert!(movement_entities(&registry).is_empty());

        // The id became reusable in that same flush.
        assert_eq!(registry.create_entity().id(), entity.id());
    }

    #[test]
    fn test_component_attachment_is_immediate() {
        let mut registry = Registry::new();
        let entity = registry.create_entity();

        registry.add_component(entity, Health(10));
        assert!(registry.has_component::<Health>(entity));
        assert_eq!(registry.component::<Health>(entity), Ok(&Health(10)));

        registry.remove_component::<Health>(entity);
        assert!(!registry.has_component::<Health>(entity));
    }

    #[test]
    fn test_remove_component_does_not_prune_membership() {
        let mut registry = Registry::new();
        registry.add_system(MovementSystem::new());

        let entity = registry.create_entity();
        registry.add_component(entity, Position::default());
        registry.add_component(entity, Velocity::default());
        registry.update();
        assert_eq!(movement_entities(&registry), vec![entity]);

        registry.remove_component::<Velocity>(entity);
        assert!(!registry.has_component::<Velocity>(entity));

        // The membership list is only recomputed for staged entities, so the
        // entity stays listed despite no longer matching the signature.
        registry.update();
        assert_eq!(movement_entities(&registry), vec![entity]);
    }

    #[test]
    fn test_movement_step() {
        let mut registry = Registry::new();
        registry.add_system(MovementSystem::new());

        let entity = registry.create_entity();
        registry.add_component(entity, Position { x: 0.0, y: 0.0 });
        registry.add_component(entity, Velocity { x: 5.0, y: 5.0 });
        registry.update();

        MovementSystem::update(&mut registry, 1.0);

        assert_eq!(
            registry.component::<Position>(entity),
            Ok(&Position { x: 5.0, y: 5.0 })
        );
    }

    #[test]
    fn test_kill_second_of_three_before_flush() {
        let mut registry = Registry::new();
        registry.add_system(MovementSystem::new());

        let entities: Vec<Entity> = (0..3)
            .map(|_| {
                let entity = registry.create_entity();
                registry.add_component(entity, Position::default());
                registry.add_component(entity, Velocity::default());
                entity
            })
            .collect();

        registry.kill_entity(entities[1]);
        registry.update();

        assert_eq!(
            movement_entities(&registry),
            vec![entities[0], entities[2]]
        );
        assert_eq!(registry.create_entity().id(), entities[1].id());
    }

    #[test]
    fn test_flushing_twice_does_not_double_add() {
        let mut registry = Registry::new();
        registry.add_system(MovementSystem::new());

        let entity = registry.create_entity();
        registry.add_component(entity, Position::default());
        registry.add_component(entity, Velocity::default());

        registry.update();
        registry.update();

        assert_eq!(movement_entities(&registry), vec![entity]);
    }

    #[test]
    fn test_recycled_id_starts_with_empty_signature() {
        let mut registry = Registry::new();

        let entity = registry.create_entity();
        registry.add_component(entity, Health(3));
        registry.update();

        registry.kill_entity(entity);
        registry.update();

        let recycled = registry.create_entity();
        assert_eq!(recycled.id(), entity.id());
        assert!(!registry.has_component::<Health>(recycled));
        assert!(registry.component::<Health>(recycled).is_err());
    }

    #[test]
    fn test_accessor_errors() {
        let mut registry = Registry::new();
        let entity = registry.create_entity();

        assert_eq!(
            registry.component::<Health>(entity),
            Err(ComponentError::Missing {
                entity,
                component: <Health as Component>::type_id().name(),
            })
        );

        let stranger = Entity::new(99);
        assert_eq!(
            registry.component::<Health>(stranger),
            Err(ComponentError::OutOfRange { entity: stranger })
        );
        assert!(!registry.has_component::<Health>(stranger));
    }

    #[test]
    fn test_system_management() {
        let mut registry = Registry::new();
        assert!(!registry.has_system::<MovementSystem>());
        assert!(registry.system::<MovementSystem>().is_none());

        registry.add_system(MovementSystem::new());
        assert!(registry.has_system::<MovementSystem>());
        assert!(registry.system::<MovementSystem>().is_some());
        assert!(registry.system_mut::<MovementSystem>().is_some());

        registry.remove_system::<MovementSystem>();
        assert!(!registry.has_system::<MovementSystem>());
    }

    #[test]
    fn test_readding_a_system_replaces_its_membership() {
        let mut registry = Registry::new();
        registry.add_system(MovementSystem::new());

        let entity = registry.create_entity();
        registry.add_component(entity, Position::default());
        registry.add_component(entity, Velocity::default());
        registry.update();
        assert_eq!(movement_entities(&registry).len(), 1);

        registry.add_system(MovementSystem::new());
        assert!(movement_entities(&registry).is_empty());
    }
}
