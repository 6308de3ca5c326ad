//! Error types for broker lookups and dependency resolution, using
//! `thiserror`.
//!
//! The taxonomy is deliberately small. A lookup miss is a broker-level
//! condition; slot resolution maps it by policy. A shape mismatch is a
//! contract violation under either policy. Anything a capability probe
//! raises beyond that is carried through unchanged.

use std::error::Error as StdError;
use thiserror::Error;

/// An arbitrary fault raised while a capability probed a provider.
///
/// Faults originate inside providers, for example a derived attribute
/// whose computation fails. The graph core never inspects them.
pub type Fault = Box<dyn StdError>;

/// Broker-level lookup errors.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// No binding was ever registered under the requested name.
    #[error("no provider bound under name {0:?}")]
    NameNotBound(String),
}

/// Errors surfaced while resolving a dependency slot.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A required slot found no binding for its name.
    #[error("required dependency {name:?} has no bound provider")]
    MissingDependency {
        /// Name the slot references
        name: String,
    },

    /// A bound provider failed the slot's capability check.
    ///
    /// Raised for required and optional slots alike. Optionality softens
    /// absence, never a present-but-nonconforming provider.
    #[error("provider bound under {name:?} does not expose {attribute:?}")]
    ContractViolation {
        /// Name the slot references
        name: String,
        /// First attribute the capability found missing
        attribute: String,
    },

    /// A fault raised inside a capability probe, passed through verbatim.
    ///
    /// Never remapped onto [`ResolveError::MissingDependency`] or
    /// [`ResolveError::ContractViolation`].
    #[error("{0}")]
    Fault(Fault),
}
