//! The runtime ties the broker, the dependency graph and the wave
//! scheduler together behind one explicit context object.
//!
//! Application code registers providers under names, components declare
//! [`Slot`](crate::component::Slot)s referencing those names, and slot
//! access wires the graph as a side effect of resolution. When a
//! provider changes, [`Runtime::update`] walks everything that depends
//! on it, directly or through a chain, and recomputes each reachable
//! component exactly once in dependency order.
//!
//! There is no global instance. Tests and embedding applications
//! construct their own runtime, which is what keeps independent runs
//! isolated.
//!
//! # Example
//!
//! ```
//! use dendrite::prelude::*;
//!
//! struct Recording;
//!
//! impl Component for Recording {
//!     fn expose(&self, attribute: &str) -> Probe {
//!         match attribute {
//!             "signal" | "sampling_rate" => Probe::Exposed,
//!             _ => Probe::Absent,
//!         }
//!     }
//! }
//!
//! struct Detector {
//!     source: Slot,
//!     waves: usize,
//! }
//!
//! impl Component for Detector {
//!     fn recompute(&mut self) {
//!         self.waves += 1;
//!     }
//! }
//!
//! let mut rt = Runtime::new();
//! rt.provide(names::SIGNAL_SOURCE, share(Recording));
//!
//! let detector = share(Detector {
//!     source: Slot::required(names::SIGNAL_SOURCE, names::signal_source()),
//!     waves: 0,
//! });
//! let provider = typed_mut::<Detector>(&detector)
//!     .unwrap()
//!     .source
//!     .resolve(&detector, &mut rt)
//!     .unwrap();
//! assert!(provider.is_some());
//!
//! rt.update_named(names::SIGNAL_SOURCE).unwrap();
//! assert_eq!(typed::<Detector>(&detector).unwrap().waves, 1);
//! ```

use crate::Policy;
use crate::broker::FeatureBroker;
use crate::capability::{Capability, Check};
use crate::component::ComponentRef;
use crate::error::{BrokerError, ResolveError};
use crate::graph::DependencyGraph;
use crate::scheduler::Scheduler;
use petgraph::prelude::NodeIndex;
use tracing::{debug, trace};

/// Explicit context owning the broker, the graph and the wave state.
pub struct Runtime {
    broker: FeatureBroker,
    graph: DependencyGraph,
    scheduler: Scheduler,

    /// Reusable buffer decoupling edge iteration from scheduling
    edge_buffer: Vec<NodeIndex>,

    /// Current wave epoch for exactly-once deduplication
    epoch: usize,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            broker: FeatureBroker::new(),
            graph: DependencyGraph::new(),
            scheduler: Scheduler::new(),
            edge_buffer: Vec::new(),
            epoch: 0,
        }
    }

    /// Bind `name` to a ready provider instance.
    ///
    /// Returns the instance itself, identity preserved. See
    /// [`FeatureBroker::provide`].
    pub fn provide(&mut self, name: impl Into<String>, provider: ComponentRef) -> ComponentRef {
        self.broker.provide(name, provider)
    }

    /// Bind `name` to a factory, instantiated lazily at most once.
    pub fn provide_with(
        &mut self,
        name: impl Into<String>,
        factory: impl FnOnce() -> ComponentRef + 'static,
    ) {
        self.broker.provide_with(name, factory);
    }

    /// Resolve `name` against the broker without declaring a dependency.
    pub fn resolve(&mut self, name: &str) -> Result<ComponentRef, BrokerError> {
        self.broker.resolve(name)
    }

    /// Read access to the broker.
    pub fn broker(&self) -> &FeatureBroker {
        &self.broker
    }

    /// Full access to the broker, for registration-time configuration.
    pub fn broker_mut(&mut self) -> &mut FeatureBroker {
        &mut self.broker
    }

    /// Resolve one dependency for `owner` (slot internal).
    ///
    /// Performs the lookup, the capability check and the edge recording
    /// in that order. The caller caches a successful result; failures are
    /// returned uncached so a later access retries.
    pub(crate) fn resolve_dependency(
        &mut self,
        owner: &ComponentRef,
        name: &str,
        policy: Policy,
        capability: &dyn Capability,
    ) -> Result<Option<ComponentRef>, ResolveError> {
        let provider = match self.broker.resolve(name) {
            Ok(provider) => provider,
            Err(BrokerError::NameNotBound(name)) => {
                return match policy {
                    Policy::Required => Err(ResolveError::MissingDependency { name }),
                    Policy::Optional => {
                        trace!(name = %name, "optional dependency absent");
                        Ok(None)
                    }
                };
            }
        };

        match capability.check(&*provider.borrow()) {
            Check::Satisfied => {}
            Check::Missing(attribute) => {
                return Err(ResolveError::ContractViolation {
                    name: name.to_owned(),
                    attribute,
                });
            }
            Check::Fault(fault) => return Err(ResolveError::Fault(fault)),
        }

        self.graph.connect(&provider, owner, name);
        Ok(Some(provider))
    }

    /// Propagate a change at `target` through its dependents.
    ///
    /// Computes the set of components reachable from `target` along
    /// dependency edges, the target itself included, and runs each
    /// component's recompute hook exactly once, shallowest first, so a
    /// dependent always observes its upstream's newest state. Diamond
    /// shapes collapse: however many paths lead to a component, it is
    /// visited once per wave.
    ///
    /// Returns the number of components recomputed. Entries whose
    /// component was dropped are skipped and swept from the graph after
    /// the wave.
    ///
    /// A panic inside a recompute hook unwinds out of this call.
    /// Components visited earlier in the wave keep their new state; there
    /// is no rollback. The next wave starts clean.
    pub fn update(&mut self, target: &ComponentRef) -> usize {
        self.epoch = self.epoch.wrapping_add(1);
        self.scheduler.reset();

        let start = self.graph.intern(target);
        let Some(depth) = self.graph.can_schedule(start, self.epoch) else {
            // wrapping collision with a stale epoch stamp; next call wins
            return 0;
        };
        self.scheduler.schedule(start, depth);

        let mut visited = 0usize;
        let mut dead: Vec<NodeIndex> = Vec::new();
        while let Some(idx) = self.scheduler.pop() {
            match self.graph.upgrade(idx) {
                Some(component) => {
                    component.borrow_mut().recompute();
                    visited += 1;
                }
                None => {
                    dead.push(idx);
                    continue;
                }
            }

            self.edge_buffer.extend(self.graph.dependents(idx));
            for child in self.edge_buffer.drain(..) {
                if let Some(child_depth) = self.graph.can_schedule(child, self.epoch) {
                    self.scheduler.schedule(child, child_depth);
                }
            }
        }

        for idx in dead {
            self.graph.remove(idx);
        }

        debug!(visited, epoch = self.epoch, "update wave finished");
        visited
    }

    /// Propagate a change at the provider bound under `name`.
    ///
    /// The named spelling of [`Runtime::update`], for driver code that
    /// knows providers by their broker names only.
    pub fn update_named(&mut self, name: &str) -> Result<usize, BrokerError> {
        let target = self.broker.resolve(name)?;
        Ok(self.update(&target))
    }

    /// Number of components the graph currently tracks.
    pub fn component_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of recorded dependency edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
