//! System bases and the trait the registry drives them through.
//!
//! A system owns two pieces of bookkeeping: the signature entities must
//! satisfy to interest it, and the list of entities currently matching.
//! Concrete systems embed a `SystemBase` carrying both and fix their
//! required signature during construction; their per-tick update logic
//! belongs to the enclosing loop, not to the registry.

use std::any::Any;

use crate::component::Component;
use crate::entity::Entity;
use crate::signature::Signature;

/// The bookkeeping every system owns: a required signature and the entities
/// currently matching it.
#[derive(Debug, Default)]
pub struct SystemBase {
    signature: Signature,
    entities: Vec<Entity>,
}

impl SystemBase {
    /// Create a system base with an empty required signature.
    pub fn new() -> SystemBase {
        SystemBase {
            signature: Signature::new(),
            entities: Vec::new(),
        }
    }

    /// Require member entities to carry component type `T`.
    ///
    /// Call during the owning system's construction, before the registry
    /// evaluates any entity against it.
    pub fn require_component<T: Component>(&mut self) {
        self.signature.insert(T::type_id());
    }

    /// Return the signature entities must satisfy to belong to this system.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Return the entities currently matching this system, in the order
    /// they joined.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Append an entity to the membership list.
    ///
    /// The registry calls this during a flush; it does not re-check the
    /// signature or deduplicate.
    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Remove an entity from the membership list.
    pub fn remove_entity(&mut self, entity: Entity) {
        self.entities.retain(|other| *other != entity);
    }
}

/// The trait the registry consumes systems through.
///
/// The registry only ever touches a system's `SystemBase`: it matches staged
/// entities against the required signature and maintains the membership
/// list. Everything else about a system is its own concern.
pub trait System: Any {
    /// Borrow the system's bookkeeping.
    fn base(&self) -> &SystemBase;

    /// Borrow the system's bookkeeping mutably.
    fn base_mut(&mut self) -> &mut SystemBase;
}
