//! Well-known provider names of the spike-sorting pipeline.
//!
//! The graph core treats every binding as opaque; these constants only
//! give the surrounding subsystems one vocabulary to register and demand
//! each other by. A file reader, a live acquisition board or a replay
//! double all bind themselves under [`SIGNAL_SOURCE`] and every
//! dependent downstream stays unchanged.
//!
//! The capability constructors pair each name with the attribute set its
//! consumers conventionally demand, so providers and dependents cannot
//! drift apart on spelling.

use crate::capability::HasAttributes;

/// Continuous recording: raw sampled data plus sampling metadata.
pub const SIGNAL_SOURCE: &str = "SignalSource";

/// Detected spike timestamps.
pub const SPIKE_MARKER_SOURCE: &str = "SpikeMarkerSource";

/// Spike waveforms extracted around the detected timestamps.
pub const SPIKE_SOURCE: &str = "SpikeSource";

/// Cluster labels assigned by a sorting front-end.
pub const LABEL_SOURCE: &str = "LabelSource";

/// Capability a [`SIGNAL_SOURCE`] provider must satisfy.
pub fn signal_source() -> HasAttributes {
    HasAttributes::new(["signal", "sampling_rate"])
}

/// Capability a [`SPIKE_MARKER_SOURCE`] provider must satisfy.
pub fn spike_marker_source() -> HasAttributes {
    HasAttributes::new(["events"])
}

/// Capability a [`SPIKE_SOURCE`] provider must satisfy.
pub fn spike_source() -> HasAttributes {
    HasAttributes::new(["waveforms"])
}

/// Capability a [`LABEL_SOURCE`] provider must satisfy.
pub fn label_source() -> HasAttributes {
    HasAttributes::new(["labels"])
}
