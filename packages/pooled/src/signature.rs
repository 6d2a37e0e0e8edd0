//! Component signatures.
//!
//! A signature is a fixed-width bitset with one bit per registered component
//! type. It plays two roles: per entity, it records which component types
//! are currently attached; per system, it records which component types an
//! entity must carry to appear in that system's membership list.

use bit_vec::BitVec;

use crate::component::{ComponentTypeID, MAX_COMPONENT_TYPES};

/// A set of component types, one bit per `ComponentTypeID`.
///
/// The width is fixed at `MAX_COMPONENT_TYPES` bits; registration caps type
/// ids below that, so every id indexes a valid bit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    bits: BitVec,
}

impl Signature {
    /// Create an empty signature.
    pub fn new() -> Signature {
        Signature {
            bits: BitVec::from_elem(MAX_COMPONENT_TYPES, false),
        }
    }

    /// Add a component type to this signature.
    pub fn insert(&mut self, type_id: ComponentTypeID) {
        self.bits.set(type_id.id(), true);
    }

    /// Remove a component type from this signature.
    pub fn remove(&mut self, type_id: ComponentTypeID) {
        self.bits.set(type_id.id(), false);
    }

    /// Returns true if this signature contains the given component type.
    pub fn includes(&self, type_id: ComponentTypeID) -> bool {
        self.bits.get(type_id.id()).unwrap_or(false)
    }

    /// Returns true if every component type in `required` is also in `self`.
    ///
    /// Extra types in `self` are irrelevant; this is the superset test used
    /// to match entities against system requirements.
    pub fn includes_all(&self, required: &Signature) -> bool {
        required
            .bits
            .blocks()
            .zip(self.bits.blocks())
            .all(|(req, have)| req & have == req)
    }

    /// Remove every component type from this signature.
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// Returns true if no component type is in this signature.
    pub fn is_empty(&self) -> bool {
        self.bits.none()
    }
}

impl Default for Signature {
    fn default() -> Signature {
        Signature::new()
    }
}
