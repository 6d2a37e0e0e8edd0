//! Base definitions for components.
//!
//! All entities in this library are built out of components. There is no
//! intrinsic value to an entity. This module provides means of defining and
//! registering component types.
//!
//! Each component type is allocated a unique ID on first use, in
//! registration order. There is a macro (`component`) to help you assign
//! this unique ID.

use std::any::type_name;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, RwLock};

use once_cell::sync::{Lazy, OnceCell};

/// The maximum number of distinct component types a process may register.
///
/// `Signature`s are fixed-width bitsets of this many bits, so registering
/// more types than this cannot be represented. Registration past the limit
/// panics rather than silently wrapping bit positions.
pub const MAX_COMPONENT_TYPES: usize = 32;

/// A component type ID which is unique for a specific component type.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentTypeID(usize);

struct ComponentRegistry {
    component_types: Vec<Arc<ComponentRegistration>>,
}

static COMPONENT_REGISTRY: Lazy<RwLock<ComponentRegistry>> = Lazy::new(|| {
    RwLock::new(ComponentRegistry {
        component_types: Vec::new(),
    })
});

impl ComponentTypeID {
    /// Construct a new `ComponentTypeID` from the inner value.
    pub(crate) fn new(inner: usize) -> ComponentTypeID {
        ComponentTypeID(inner)
    }

    /// Create a new globally unique `ComponentTypeID`.
    ///
    /// IDs are handed out sequentially starting at zero, in first-call
    /// order. Panics if `MAX_COMPONENT_TYPES` types are already registered.
    pub fn register<T: Component>() -> ComponentTypeID {
        let mut r = COMPONENT_REGISTRY.write().unwrap();
        let id = ComponentTypeID(r.component_types.len());
        if id.0 >= MAX_COMPONENT_TYPES {
            panic!(
                "cannot register component type {}: limit of {} distinct types reached",
                type_name::<T>(),
                MAX_COMPONENT_TYPES
            );
        }

        r.component_types
            .push(Arc::new(ComponentRegistration::new::<T>(id)));
        id
    }

    /// Fetch the registration for this `ComponentTypeID` returning None if it
    /// is missing from the registry.
    fn safe_registration(&self) -> Option<Arc<ComponentRegistration>> {
        let r = COMPONENT_REGISTRY.read().unwrap();
        r.component_types.get(self.0).cloned()
    }

    /// Fetch the registration information for a component type.
    pub fn registration(&self) -> Arc<ComponentRegistration> {
        self.safe_registration().unwrap()
    }

    /// Return the inner unique ID.
    pub fn id(&self) -> usize {
        self.0
    }

    /// Return the name of this registration.
    pub fn name(&self) -> &'static str {
        self.registration().name()
    }
}

impl Debug for ComponentTypeID {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.safe_registration() {
            Some(reg) => write!(f, "{}", reg.name()),
            None => write!(f, "ComponentTypeID(#{} missing)", self.0),
        }
    }
}

/// A struct for lazily assigning unique `ComponentTypeID`s.
pub struct AutoComponentTypeID(OnceCell<ComponentTypeID>);

impl AutoComponentTypeID {
    /// Create a new `AutoComponentTypeID`.
    pub const fn new() -> AutoComponentTypeID {
        AutoComponentTypeID(OnceCell::new())
    }

    /// Get the `ComponentTypeID` this struct wraps.
    pub fn get<T: Component>(&self) -> ComponentTypeID {
        self.0.get_or_init(ComponentTypeID::register::<T>).clone()
    }
}

/// The component trait is implemented on all component types.
///
/// Component values live in a dense `Pool` per type, indexed by entity id;
/// `Default` fills the slots of entities which have not had the component
/// attached yet.
pub trait Component: Debug + Default + 'static {
    /// Get the unique type ID of this component.
    fn type_id() -> ComponentTypeID;
}

/// A ComponentRegistration is the dynamic version of a type implementing
/// Component.
#[derive(Clone, Copy)]
pub struct ComponentRegistration {
    type_id: ComponentTypeID,
    name: &'static str,
}

impl ComponentRegistration {
    /// Create a ComponentRegistration for a static type.
    pub fn new<T: Component>(type_id: ComponentTypeID) -> ComponentRegistration {
        ComponentRegistration {
            type_id,
            name: type_name::<T>(),
        }
    }

    /// Return the unique type ID for this `ComponentRegistration`.
    pub fn type_id(&self) -> ComponentTypeID {
        self.type_id
    }

    /// Get the name of this component type.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Debug for ComponentRegistration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<ComponentRegistration {:?}>", self.type_id.id())
    }
}

/// Implement the `Component` trait on a type.
///
/// Component types must implement Debug and Default.
#[macro_export]
macro_rules! component {
    ($i:ident) => {
        const _: () = {
            static INIT_TYPE: $crate::component::AutoComponentTypeID =
                $crate::component::AutoComponentTypeID::new();

            impl $crate::component::Component for $i {
                fn type_id() -> $crate::component::ComponentTypeID {
                    INIT_TYPE.get::<$i>()
                }
            }

            ()
        };
    };
}
