//! The feature broker maps names to provider bindings.
//!
//! The broker is the configuration seam of the pipeline. The same graph
//! topology runs against live recordings, file-backed replays, or test
//! doubles purely by what gets bound under each well-known name before
//! the dependents resolve. Bindings are either ready instances or
//! zero-argument factories; a factory is instantiated at most once, on
//! first resolution, and every later resolver of that name observes the
//! identical instance.
//!
//! The broker holds no lock. It is explicit, mutable, single-threaded
//! state owned by a [`Runtime`](crate::runtime::Runtime); independent
//! test runs isolate themselves by constructing a fresh runtime rather
//! than unbinding names from a shared one.

use crate::component::ComponentRef;
use crate::error::BrokerError;
use ahash::AHashMap;
use tracing::{debug, trace};

type FactoryFn = Box<dyn FnOnce() -> ComponentRef>;

/// A name's current binding.
///
/// `Factory` is normalized to `Instance` on first resolution, which is
/// what makes class-style bindings singletons per name.
enum Binding {
    Instance(ComponentRef),
    Factory(FactoryFn),
}

/// Process-scoped registry mapping names to provider bindings.
#[derive(Default)]
pub struct FeatureBroker {
    bindings: AHashMap<String, Binding>,
}

impl FeatureBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a ready instance.
    ///
    /// Overwrites any prior binding for the name without error. Dependents
    /// that already resolved the old binding keep their cached reference;
    /// only future resolutions observe the new one.
    ///
    /// Returns the instance itself, identity preserved, so registration
    /// sites can keep using the handle they just bound.
    pub fn provide(&mut self, name: impl Into<String>, provider: ComponentRef) -> ComponentRef {
        let name = name.into();
        assert!(!name.is_empty(), "binding name must be non-empty");
        let rebound = self
            .bindings
            .insert(name.clone(), Binding::Instance(provider.clone()))
            .is_some();
        debug!(name = %name, rebound, "bound instance provider");
        provider
    }

    /// Bind `name` to a factory, instantiated lazily at most once.
    pub fn provide_with(
        &mut self,
        name: impl Into<String>,
        factory: impl FnOnce() -> ComponentRef + 'static,
    ) {
        let name = name.into();
        assert!(!name.is_empty(), "binding name must be non-empty");
        let rebound = self
            .bindings
            .insert(name.clone(), Binding::Factory(Box::new(factory)))
            .is_some();
        debug!(name = %name, rebound, "bound factory provider");
    }

    /// Resolve `name` to its bound instance.
    ///
    /// A factory binding is instantiated here and memoized, so every
    /// resolver of the name shares one instance.
    pub fn resolve(&mut self, name: &str) -> Result<ComponentRef, BrokerError> {
        match self.bindings.get(name) {
            Some(Binding::Instance(provider)) => Ok(provider.clone()),
            Some(Binding::Factory(_)) => {
                // take the entry to call the FnOnce, then rebind the result
                let Some(Binding::Factory(factory)) = self.bindings.remove(name) else {
                    unreachable!("binding changed underneath resolve");
                };
                let provider = factory();
                trace!(name = %name, "materialized factory binding");
                self.bindings
                    .insert(name.to_owned(), Binding::Instance(provider.clone()));
                Ok(provider)
            }
            None => Err(BrokerError::NameNotBound(name.to_owned())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{share, typed};
    use crate::testing::{Inert, TextSource};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn provide_returns_the_exact_instance() {
        let mut broker = FeatureBroker::new();
        let source = share(TextSource::new("some data"));
        let returned = broker.provide("Data", source.clone());
        assert!(Rc::ptr_eq(&source, &returned));
    }

    #[test]
    fn resolve_of_an_instance_binding_preserves_identity() {
        let mut broker = FeatureBroker::new();
        let source = broker.provide("Data", share(TextSource::new("some data")));
        let resolved = broker.resolve("Data").unwrap();
        assert!(Rc::ptr_eq(&source, &resolved));
    }

    #[test]
    fn unbound_names_report_name_not_bound() {
        let mut broker = FeatureBroker::new();
        let err = broker.resolve("Data").err().unwrap();
        let BrokerError::NameNotBound(name) = err;
        assert_eq!(name, "Data");
    }

    #[test]
    fn factory_bindings_instantiate_exactly_once() {
        let mut broker = FeatureBroker::new();
        let built = Rc::new(Cell::new(0u32));
        let counter = built.clone();
        broker.provide_with("Data", move || {
            counter.set(counter.get() + 1);
            share(TextSource::new("some data"))
        });

        let first = broker.resolve("Data").unwrap();
        let second = broker.resolve("Data").unwrap();
        assert_eq!(built.get(), 1);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(typed::<TextSource>(&first).unwrap().data, "some data");
    }

    #[test]
    fn rebinding_replaces_the_binding() {
        let mut broker = FeatureBroker::new();
        let old = broker.provide("Data", share(TextSource::new("old")));
        let new = broker.provide("Data", share(TextSource::new("new")));
        let resolved = broker.resolve("Data").unwrap();
        assert!(!Rc::ptr_eq(&old, &resolved));
        assert!(Rc::ptr_eq(&new, &resolved));
        assert_eq!(broker.len(), 1);
    }

    #[test]
    fn contains_does_not_materialize_factories() {
        let mut broker = FeatureBroker::new();
        broker.provide_with("Sink", || share(Inert));
        assert!(broker.contains("Sink"));
        assert!(!broker.contains("Source"));
    }
}
