use enum_as_inner::EnumAsInner;

pub mod broker;
pub mod capability;
pub mod component;
pub mod error;
pub mod names;
pub mod runtime;

pub(crate) mod graph;
pub(crate) mod scheduler;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Defines how a dependency slot treats the absence of its provider.
///
/// Optionality only softens a lookup miss. A provider that is bound but
/// fails its capability check is an error under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumAsInner)]
pub enum Policy {
    /// Absence of the named provider is an error.
    ///
    /// Use `Required` for dependencies the owning component cannot work
    /// without, such as a spike browser's signal source.
    Required,

    /// Absence of the named provider yields an absent value.
    ///
    /// Use `Optional` for dependencies that enrich a component when
    /// present, such as precomputed cluster labels.
    Optional,
}

pub mod prelude {
    pub use crate::Policy;
    pub use crate::broker::FeatureBroker;
    pub use crate::capability::{AllOf, Capability, Check, HasAttributes, Probe, Unchecked};
    pub use crate::component::{Component, ComponentRef, Slot, share, typed, typed_mut};
    pub use crate::error::{BrokerError, ResolveError};
    pub use crate::names;
    pub use crate::runtime::Runtime;
}
