//! Capability constraints validate that a provider structurally satisfies
//! a dependent's expectations before the two are wired together.
//!
//! Probing has three distinct outcomes rather than two. A provider that
//! genuinely lacks an attribute maps to the absence signal; a provider
//! whose attribute exists but faults while being computed surfaces that
//! fault unchanged. Collapsing the two would let broken providers pass as
//! merely absent, which is exactly the failure mode this split prevents.

use crate::component::Component;
use crate::error::Fault;
use enum_as_inner::EnumAsInner;

/// Outcome of probing a single named attribute on a candidate provider.
#[derive(Debug, EnumAsInner)]
pub enum Probe {
    /// The attribute is present and readable.
    Exposed,

    /// The attribute is genuinely absent from the provider.
    Absent,

    /// Reading the attribute raised an unrelated fault.
    ///
    /// The fault must reach the resolving caller verbatim. It is never
    /// reinterpreted as absence.
    Fault(Fault),
}

/// Outcome of evaluating a full capability constraint.
#[derive(Debug, EnumAsInner)]
pub enum Check {
    /// Every probed attribute is present.
    Satisfied,

    /// The named attribute is missing from the candidate.
    Missing(String),

    /// Probing raised a fault unrelated to presence.
    Fault(Fault),
}

/// A composable predicate over a candidate provider.
///
/// A slot stores one capability and evaluates it once, at resolution
/// time. Cached reads are not re-checked.
pub trait Capability {
    fn check(&self, candidate: &dyn Component) -> Check;
}

/// Requires that the candidate exposes every listed attribute.
///
/// This is the workhorse constraint of the pipeline. A spike browser, for
/// example, demands a signal source exposing `signal` and
/// `sampling_rate` without caring about the provider's concrete type.
#[derive(Debug, Clone)]
pub struct HasAttributes {
    attributes: Vec<String>,
}

impl HasAttributes {
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    /// Attributes this constraint probes, in probe order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }
}

impl Capability for HasAttributes {
    fn check(&self, candidate: &dyn Component) -> Check {
        for attribute in &self.attributes {
            match candidate.expose(attribute) {
                Probe::Exposed => {}
                Probe::Absent => return Check::Missing(attribute.clone()),
                Probe::Fault(fault) => return Check::Fault(fault),
            }
        }
        Check::Satisfied
    }
}

/// Accepts any candidate without probing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unchecked;

impl Capability for Unchecked {
    fn check(&self, _candidate: &dyn Component) -> Check {
        Check::Satisfied
    }
}

/// Conjunction of capabilities, evaluated left to right.
///
/// Evaluation stops at the first non-satisfied result, so a fault in an
/// early capability shadows a missing attribute in a later one.
#[derive(Default)]
pub struct AllOf {
    parts: Vec<Box<dyn Capability>>,
}

impl AllOf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, capability: impl Capability + 'static) -> Self {
        self.parts.push(Box::new(capability));
        self
    }
}

impl Capability for AllOf {
    fn check(&self, candidate: &dyn Component) -> Check {
        for part in &self.parts {
            match part.check(candidate) {
                Check::Satisfied => {}
                other => return other,
            }
        }
        Check::Satisfied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BrokenSource, Inert, TextSource};

    #[test]
    fn has_attributes_accepts_a_conforming_provider() {
        let source = TextSource::new("some data");
        let cap = HasAttributes::new(["data"]);
        assert!(cap.check(&source).is_satisfied());
    }

    #[test]
    fn has_attributes_reports_the_missing_attribute() {
        let cap = HasAttributes::new(["data", "events"]);
        match cap.check(&TextSource::new("some data")) {
            Check::Missing(attr) => assert_eq!(attr, "events"),
            other => panic!("expected Missing, got {other:?}"),
        }
    }

    #[test]
    fn has_attributes_passes_probe_faults_through() {
        let cap = HasAttributes::new(["data"]);
        match cap.check(&BrokenSource::default()) {
            Check::Fault(fault) => {
                assert!(fault.to_string().contains("empty"));
            }
            other => panic!("expected Fault, got {other:?}"),
        }
    }

    #[test]
    fn unchecked_accepts_anything() {
        assert!(Unchecked.check(&Inert).is_satisfied());
    }

    #[test]
    fn all_of_stops_at_the_first_failure() {
        let cap = AllOf::new()
            .with(Unchecked)
            .with(HasAttributes::new(["data"]));
        assert!(cap.check(&TextSource::new("x")).is_satisfied());
        assert!(matches!(cap.check(&Inert), Check::Missing(_)));
    }
}
