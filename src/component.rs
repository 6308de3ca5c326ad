//! Components and their dependency slots.
//!
//! A component is any stateful participant in the graph. The trait keeps
//! data and graph behavior separate: the struct holds the state, while
//! `expose` declares the capability surface other components may demand
//! and `recompute` reacts to upstream changes. Neither hook receives the
//! [`Runtime`](crate::runtime::Runtime), so a recompute cannot resolve
//! slots or mutate the graph mid-wave.

use crate::Policy;
use crate::capability::{Capability, Probe};
use crate::error::ResolveError;
use crate::runtime::Runtime;
use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// A stateful participant in the component graph.
///
/// Both hooks have defaults so plain data providers stay terse:
///
/// ```
/// use dendrite::prelude::*;
///
/// struct ClusterLabels {
///     labels: Vec<u16>,
/// }
///
/// impl Component for ClusterLabels {
///     fn expose(&self, attribute: &str) -> Probe {
///         match attribute {
///             "labels" => Probe::Exposed,
///             _ => Probe::Absent,
///         }
///     }
/// }
/// ```
pub trait Component: Any {
    /// Probe a named capability attribute.
    ///
    /// Implementations report [`Probe::Exposed`] for attributes they
    /// carry, [`Probe::Absent`] for everything else, and
    /// [`Probe::Fault`] when computing the attribute's value fails for a
    /// reason other than absence.
    fn expose(&self, attribute: &str) -> Probe {
        let _ = attribute;
        Probe::Absent
    }

    /// React to an upstream change.
    ///
    /// Invoked exactly once per update wave that reaches this component,
    /// after every in-wave prerequisite has already run. Pure
    /// self-mutation; the graph is not reachable from here.
    fn recompute(&mut self) {}
}

/// Shared handle to a type-erased component.
///
/// Identity is allocation identity (`Rc::ptr_eq`), which is what the
/// graph dedups by.
pub type ComponentRef = Rc<RefCell<dyn Component>>;

/// Wraps a component for registration and slot wiring.
pub fn share<T: Component>(component: T) -> ComponentRef {
    Rc::new(RefCell::new(component))
}

/// Borrow a shared component at its concrete type.
///
/// Returns `None` if the handle holds a different type.
pub fn typed<T: Component>(component: &ComponentRef) -> Option<Ref<'_, T>> {
    Ref::filter_map(component.borrow(), |c| {
        let any: &dyn Any = c;
        any.downcast_ref::<T>()
    })
    .ok()
}

/// Mutably borrow a shared component at its concrete type.
pub fn typed_mut<T: Component>(component: &ComponentRef) -> Option<RefMut<'_, T>> {
    RefMut::filter_map(component.borrow_mut(), |c| {
        let any: &mut dyn Any = c;
        any.downcast_mut::<T>()
    })
    .ok()
}

/// A declared, named, constrained dependency of one owning component.
///
/// Slots begin unresolved. The first successful [`resolve`](Slot::resolve)
/// caches the provider for the slot's lifetime and records a dependency
/// edge from the provider to the owner, which is what update waves walk.
/// Failed resolutions cache nothing, so the next access retries against
/// the broker's current bindings.
///
/// Rebinding a name after a slot has cached its resolution does not
/// rewire the slot. The owner keeps the provider it first saw.
pub struct Slot {
    name: String,
    policy: Policy,
    capability: Box<dyn Capability>,
    resolved: Option<ComponentRef>,
}

impl Slot {
    /// Declare a dependency whose absence is an error.
    pub fn required(name: impl Into<String>, capability: impl Capability + 'static) -> Self {
        Self::new(name, Policy::Required, capability)
    }

    /// Declare a dependency whose absence yields `None`.
    pub fn optional(name: impl Into<String>, capability: impl Capability + 'static) -> Self {
        Self::new(name, Policy::Optional, capability)
    }

    fn new(name: impl Into<String>, policy: Policy, capability: impl Capability + 'static) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "slot name must be non-empty");
        Self {
            name,
            policy,
            capability: Box::new(capability),
            resolved: None,
        }
    }

    /// Name this slot resolves against.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// The cached provider, if this slot has already resolved.
    pub fn peek(&self) -> Option<&ComponentRef> {
        self.resolved.as_ref()
    }

    /// Resolve this slot against the runtime's broker.
    ///
    /// On the first access this looks the name up, validates the found
    /// provider against the slot's capability and records the dependency
    /// edge. Subsequent accesses return the cached provider without
    /// touching the broker or re-validating.
    ///
    /// `owner` is the component this slot belongs to; it becomes the
    /// dependent end of the recorded edge.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::MissingDependency`] when a required name is not
    ///   bound. An optional lookup miss returns `Ok(None)` instead.
    /// - [`ResolveError::ContractViolation`] when a bound provider fails
    ///   the capability check, under either policy.
    /// - [`ResolveError::Fault`] carrying, verbatim, any fault raised
    ///   while the capability probed the provider.
    pub fn resolve(
        &mut self,
        owner: &ComponentRef,
        runtime: &mut Runtime,
    ) -> Result<Option<ComponentRef>, ResolveError> {
        if let Some(provider) = &self.resolved {
            return Ok(Some(provider.clone()));
        }

        let provider = runtime.resolve_dependency(
            owner,
            &self.name,
            self.policy,
            self.capability.as_ref(),
        )?;
        if let Some(provider) = &provider {
            self.resolved = Some(provider.clone());
        }
        Ok(provider)
    }
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("resolved", &self.resolved.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Unchecked;
    use crate::testing::TextSource;

    #[test]
    fn shared_handles_preserve_identity() {
        let a = share(TextSource::new("some data"));
        let b = a.clone();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn typed_borrows_recover_the_concrete_component() {
        let source = share(TextSource::new("some data"));
        assert_eq!(typed::<TextSource>(&source).unwrap().data, "some data");

        typed_mut::<TextSource>(&source).unwrap().data = "other".into();
        assert_eq!(typed::<TextSource>(&source).unwrap().data, "other");
    }

    #[test]
    fn typed_borrow_of_the_wrong_type_is_none() {
        let source = share(TextSource::new("some data"));
        assert!(typed::<crate::testing::Inert>(&source).is_none());
    }

    #[test]
    #[should_panic(expected = "non-empty")]
    fn empty_slot_names_are_rejected() {
        let _ = Slot::required("", Unchecked);
    }

    #[test]
    fn fresh_slots_are_unresolved() {
        let slot = Slot::optional("SignalSource", Unchecked);
        assert!(slot.peek().is_none());
        assert!(slot.policy().is_optional());
        assert_eq!(slot.name(), "SignalSource");
    }
}
