//! Fixture components shared by the crate's tests and by embedding
//! applications that want ready-made doubles for pipeline providers.
//!
//! Available under `#[cfg(test)]` and behind the `testing` feature.

use crate::capability::{HasAttributes, Probe};
use crate::component::{Component, ComponentRef, Slot, typed};
use crate::error::ResolveError;
use crate::runtime::Runtime;
use std::cell::Cell;
use std::error::Error;
use std::fmt;

/// Minimal data provider exposing a single `data` attribute.
pub struct TextSource {
    pub data: String,
}

impl TextSource {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

impl Component for TextSource {
    fn expose(&self, attribute: &str) -> Probe {
        match attribute {
            "data" => Probe::Exposed,
            _ => Probe::Absent,
        }
    }
}

/// A component exposing nothing, for contract-violation scenarios.
pub struct Inert;

impl Component for Inert {}

/// Raised when [`BrokenSource`] tries to summarize an empty buffer.
#[derive(Debug)]
pub struct EmptyBuffer;

impl fmt::Display for EmptyBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("mean of an empty sample buffer")
    }
}

impl Error for EmptyBuffer {}

/// A provider whose `data` attribute is derived and faults on probe.
///
/// Its buffer is empty by default, so computing the summary fails for a
/// reason that has nothing to do with the attribute being absent. The
/// fault must reach slot callers unchanged.
#[derive(Default)]
pub struct BrokenSource {
    pub samples: Vec<f32>,
}

impl BrokenSource {
    fn mean(&self) -> Result<f32, EmptyBuffer> {
        if self.samples.is_empty() {
            return Err(EmptyBuffer);
        }
        Ok(self.samples.iter().sum::<f32>() / self.samples.len() as f32)
    }
}

impl Component for BrokenSource {
    fn expose(&self, attribute: &str) -> Probe {
        match attribute {
            "data" => match self.mean() {
                Ok(_) => Probe::Exposed,
                Err(fault) => Probe::Fault(Box::new(fault)),
            },
            _ => Probe::Absent,
        }
    }
}

/// Counts capability probes, to assert that cached slot reads skip
/// re-validation.
#[derive(Default)]
pub struct ProbeCountingSource {
    probes: Cell<u32>,
}

impl ProbeCountingSource {
    pub fn probes(&self) -> u32 {
        self.probes.get()
    }
}

impl Component for ProbeCountingSource {
    fn expose(&self, attribute: &str) -> Probe {
        self.probes.set(self.probes.get() + 1);
        match attribute {
            "data" => Probe::Exposed,
            _ => Probe::Absent,
        }
    }
}

/// A counting pass-through component.
///
/// Declares one required `data` dependency on a configurable name,
/// exposes `data` itself so relays can stack into chains, and records
/// both its own recompute count and the upstream relay's count observed
/// during its latest recompute. The latter is what ordering tests check:
/// a downstream relay must see its upstream already recomputed.
pub struct Relay {
    slot: Slot,
    pub recomputes: u32,
    pub upstream_recomputes: u32,
}

impl Relay {
    pub fn new(upstream: impl Into<String>) -> Self {
        Self {
            slot: Slot::required(upstream, HasAttributes::new(["data"])),
            recomputes: 0,
            upstream_recomputes: 0,
        }
    }

    /// Resolve this relay's dependency, wiring it into the graph.
    ///
    /// `owner` must be the shared handle holding this relay.
    pub fn resolve_against(
        &mut self,
        owner: &ComponentRef,
        runtime: &mut Runtime,
    ) -> Result<Option<ComponentRef>, ResolveError> {
        self.slot.resolve(owner, runtime)
    }
}

impl Component for Relay {
    fn expose(&self, attribute: &str) -> Probe {
        match attribute {
            "data" => Probe::Exposed,
            _ => Probe::Absent,
        }
    }

    fn recompute(&mut self) {
        self.recomputes += 1;
        if let Some(upstream) = self.slot.peek() {
            if let Some(up) = typed::<Relay>(upstream) {
                self.upstream_recomputes = up.recomputes;
            }
        }
    }
}
