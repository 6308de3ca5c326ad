//! Explicit adjacency structure for the dependency graph.
//!
//! Edges point provider to dependent, so an update wave is a forward
//! walk from the changed node. Nodes are arena slots keyed by
//! `NodeIndex`; the graph holds weak handles only, which keeps component
//! lifetimes in the hands of application code and avoids reference
//! cycles through the arena.

use crate::component::{Component, ComponentRef};
use ahash::AHashMap;
use petgraph::prelude::{EdgeRef, NodeIndex};
use petgraph::stable_graph::StableGraph;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::debug;

/// Identity key of a shared component: the allocation address, with the
/// vtable metadata discarded.
type IdentityKey = *const ();

fn identity(component: &ComponentRef) -> IdentityKey {
    Rc::as_ptr(component) as IdentityKey
}

pub(crate) struct EntryContext {
    handle: Weak<RefCell<dyn Component>>,
    key: IdentityKey,
    depth: u32,
    sched_epoch: usize,
}

impl EntryContext {
    fn new(component: &ComponentRef) -> Self {
        Self {
            handle: Rc::downgrade(component),
            key: identity(component),
            depth: 0,
            sched_epoch: 0,
        }
    }
}

pub(crate) struct DependencyGraph {
    inner: StableGraph<EntryContext, String>,
    index_of: AHashMap<IdentityKey, NodeIndex>,
}

impl DependencyGraph {
    pub(crate) fn new() -> Self {
        Self {
            inner: StableGraph::new(),
            index_of: AHashMap::new(),
        }
    }

    /// Returns the arena index for a component, adding it on first sight.
    ///
    /// A stale entry whose component was dropped and whose allocation got
    /// reused is replaced rather than resurrected.
    pub(crate) fn intern(&mut self, component: &ComponentRef) -> NodeIndex {
        let key = identity(component);
        if let Some(&idx) = self.index_of.get(&key) {
            let entry = &self.inner[idx];
            if entry.handle.strong_count() > 0 {
                return idx;
            }
            self.inner.remove_node(idx);
        }
        let idx = self.inner.add_node(EntryContext::new(component));
        self.index_of.insert(key, idx);
        idx
    }

    /// Record a dependency edge from provider to dependent owner.
    ///
    /// Re-recording the same pair updates the edge label in place, so the
    /// edge set never holds parallel duplicates. The owner's depth is
    /// raised above the provider's and the raise is relaxed through any
    /// dependents the owner already has.
    pub(crate) fn connect(
        &mut self,
        provider: &ComponentRef,
        owner: &ComponentRef,
        name: &str,
    ) -> (NodeIndex, NodeIndex) {
        let provider_idx = self.intern(provider);
        let owner_idx = self.intern(owner);
        self.inner
            .update_edge(provider_idx, owner_idx, name.to_owned());
        debug!(
            name = %name,
            provider = provider_idx.index(),
            owner = owner_idx.index(),
            "recorded dependency edge"
        );
        self.relax_depths(provider_idx);
        (provider_idx, owner_idx)
    }

    /// Push depth increases downstream of `from` until they settle.
    ///
    /// Terminates on any acyclic graph; the per-node bound only exists to
    /// surface an accidental dependency cycle instead of spinning.
    fn relax_depths(&mut self, from: NodeIndex) {
        let bound = self.inner.node_count() as u32;
        let mut stack = vec![from];
        while let Some(parent) = stack.pop() {
            let floor = self.inner[parent].depth + 1;
            debug_assert!(floor <= bound, "dependency cycle while relaxing depths");
            let raised: Vec<NodeIndex> = self
                .inner
                .edges(parent)
                .filter(|edge| self.inner[edge.target()].depth < floor)
                .map(|edge| edge.target())
                .collect();
            for child in raised {
                self.inner[child].depth = floor;
                stack.push(child);
            }
        }
    }

    /// Marks the node as scheduled for `epoch` and returns its depth, or
    /// `None` if it was already scheduled in this epoch.
    ///
    /// This is the exactly-once guarantee: however many paths reach a
    /// node during one wave, only the first call wins.
    pub(crate) fn can_schedule(&mut self, idx: NodeIndex, epoch: usize) -> Option<u32> {
        let entry = &mut self.inner[idx];
        if entry.sched_epoch == epoch {
            return None;
        }
        entry.sched_epoch = epoch;
        Some(entry.depth)
    }

    /// Direct dependents of a node.
    pub(crate) fn dependents(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner
            .edges_directed(idx, petgraph::Direction::Outgoing)
            .map(|edge| edge.target())
    }

    /// Upgrade an arena entry to a live handle, if the component survives.
    pub(crate) fn upgrade(&self, idx: NodeIndex) -> Option<ComponentRef> {
        self.inner[idx].handle.upgrade()
    }

    #[cfg(test)]
    pub(crate) fn depth(&self, idx: NodeIndex) -> u32 {
        self.inner[idx].depth
    }

    /// Drop an entry whose component is gone, together with its edges.
    pub(crate) fn remove(&mut self, idx: NodeIndex) {
        if let Some(entry) = self.inner.remove_node(idx) {
            self.index_of.remove(&entry.key);
        }
    }

    pub(crate) fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::share;
    use crate::testing::TextSource;

    fn source(text: &'static str) -> ComponentRef {
        share(TextSource::new(text))
    }

    #[test]
    fn intern_is_stable_per_identity() {
        let mut graph = DependencyGraph::new();
        let a = source("a");
        let b = source("b");

        let a_idx = graph.intern(&a);
        let b_idx = graph.intern(&b);
        assert_ne!(a_idx, b_idx);
        assert_eq!(graph.intern(&a), a_idx);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn connect_does_not_duplicate_edges() {
        let mut graph = DependencyGraph::new();
        let provider = source("p");
        let owner = source("o");

        graph.connect(&provider, &owner, "Data");
        graph.connect(&provider, &owner, "Data");
        assert_eq!(graph.edge_count(), 1);

        let (p_idx, _) = graph.connect(&provider, &owner, "Data");
        let dependents: Vec<_> = graph.dependents(p_idx).collect();
        assert_eq!(dependents.len(), 1);
    }

    #[test]
    fn depths_follow_the_dependency_chain() {
        let mut graph = DependencyGraph::new();
        let x = source("x");
        let y = source("y");
        let z = source("z");

        // z depends on y, y depends on x
        let (y_idx, z_idx) = graph.connect(&y, &z, "Data2");
        let (x_idx, _) = graph.connect(&x, &y, "Data");

        assert_eq!(graph.depth(x_idx), 0);
        assert_eq!(graph.depth(y_idx), 1);
        // the late x edge must push z below y again
        assert_eq!(graph.depth(z_idx), 2);
    }

    #[test]
    fn diamond_depth_puts_the_join_below_both_arms() {
        let mut graph = DependencyGraph::new();
        let x = source("x");
        let y = source("y");
        let z = source("z");

        let (x_idx, y_idx) = graph.connect(&x, &y, "Data");
        graph.connect(&x, &z, "Data");
        let (_, z_idx) = graph.connect(&y, &z, "Data2");

        assert_eq!(graph.depth(x_idx), 0);
        assert_eq!(graph.depth(y_idx), 1);
        assert_eq!(graph.depth(z_idx), 2);
    }

    #[test]
    fn can_schedule_dedups_within_an_epoch() {
        let mut graph = DependencyGraph::new();
        let a = source("a");
        let idx = graph.intern(&a);

        assert_eq!(graph.can_schedule(idx, 1), Some(0));
        assert_eq!(graph.can_schedule(idx, 1), None);
        assert_eq!(graph.can_schedule(idx, 2), Some(0));
    }

    #[test]
    fn dropped_components_upgrade_to_none() {
        let mut graph = DependencyGraph::new();
        let a = source("a");
        let idx = graph.intern(&a);
        assert!(graph.upgrade(idx).is_some());

        drop(a);
        assert!(graph.upgrade(idx).is_none());
        graph.remove(idx);
        assert_eq!(graph.node_count(), 0);
    }
}
