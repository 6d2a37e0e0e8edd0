//! Errors reported by registry accessors.

use thiserror::Error;

use crate::entity::Entity;

/// The error returned when a component lookup cannot be satisfied.
///
/// These are misuse errors: entity/component bookkeeping itself never fails
/// during normal operation, so the mutating registry calls are infallible
/// and only the accessors report.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// The entity's signature does not include the requested component type.
    #[error("{entity:?} has no {component} component")]
    Missing {
        entity: Entity,
        component: &'static str,
    },

    /// The entity id was never issued by this registry.
    #[error("{entity:?} is out of range for this registry")]
    OutOfRange { entity: Entity },
}
