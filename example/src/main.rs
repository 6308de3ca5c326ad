use dendrite::prelude::*;
use tracing::info;

/// In-memory stand-in for a recorded extracellular trace.
struct Recording {
    samples: Vec<f32>,
    sampling_rate: f32,
}

impl Recording {
    fn new(sampling_rate: f32) -> Self {
        Self {
            samples: Vec::new(),
            sampling_rate,
        }
    }

    fn acquire(&mut self, chunk: impl IntoIterator<Item = f32>) {
        self.samples.extend(chunk);
    }
}

impl Component for Recording {
    fn expose(&self, attribute: &str) -> Probe {
        match attribute {
            "signal" | "sampling_rate" => Probe::Exposed,
            _ => Probe::Absent,
        }
    }
}

/// Threshold crossings over the signal source.
struct ThresholdDetector {
    source: Slot,
    threshold: f32,
    events: Vec<usize>,
}

impl ThresholdDetector {
    fn new(threshold: f32) -> Self {
        Self {
            source: Slot::required(names::SIGNAL_SOURCE, names::signal_source()),
            threshold,
            events: Vec::new(),
        }
    }
}

impl Component for ThresholdDetector {
    fn expose(&self, attribute: &str) -> Probe {
        match attribute {
            "events" => Probe::Exposed,
            _ => Probe::Absent,
        }
    }

    fn recompute(&mut self) {
        let Some(source) = self.source.peek() else {
            return;
        };
        let Some(recording) = typed::<Recording>(source) else {
            return;
        };
        self.events = recording
            .samples
            .iter()
            .enumerate()
            .filter(|(_, &v)| v > self.threshold)
            .map(|(i, _)| i)
            .collect();
    }
}

/// Waveform snippets cut around each detected event.
struct WaveformCatalog {
    signal: Slot,
    markers: Slot,
    window: usize,
    waveforms: Vec<Vec<f32>>,
}

impl WaveformCatalog {
    fn new(window: usize) -> Self {
        Self {
            signal: Slot::required(names::SIGNAL_SOURCE, names::signal_source()),
            markers: Slot::required(names::SPIKE_MARKER_SOURCE, names::spike_marker_source()),
            window,
            waveforms: Vec::new(),
        }
    }
}

impl Component for WaveformCatalog {
    fn expose(&self, attribute: &str) -> Probe {
        match attribute {
            "waveforms" => Probe::Exposed,
            _ => Probe::Absent,
        }
    }

    fn recompute(&mut self) {
        let (Some(signal), Some(markers)) = (self.signal.peek(), self.markers.peek()) else {
            return;
        };
        let (Some(recording), Some(detector)) = (
            typed::<Recording>(signal),
            typed::<ThresholdDetector>(markers),
        ) else {
            return;
        };
        self.waveforms = detector
            .events
            .iter()
            .map(|&at| {
                let end = (at + self.window).min(recording.samples.len());
                recording.samples[at..end].to_vec()
            })
            .collect();
    }
}

/// Console stand-in for the interactive spike browser.
struct SpikeBrowser {
    waves: Slot,
    labels: Slot,
    refreshes: u32,
}

impl SpikeBrowser {
    fn new() -> Self {
        Self {
            waves: Slot::required(names::SPIKE_SOURCE, names::spike_source()),
            labels: Slot::optional(names::LABEL_SOURCE, names::label_source()),
            refreshes: 0,
        }
    }
}

impl Component for SpikeBrowser {
    fn recompute(&mut self) {
        self.refreshes += 1;
        let Some(waves) = self.waves.peek() else {
            return;
        };
        if let Some(catalog) = typed::<WaveformCatalog>(waves) {
            info!(
                refresh = self.refreshes,
                spikes = catalog.waveforms.len(),
                labeled = self.labels.peek().is_some(),
                "browser redrew"
            );
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,dendrite=debug")),
        )
        .init();

    let mut rt = Runtime::new();

    let recording = rt.provide(names::SIGNAL_SOURCE, share(Recording::new(25_000.0)));
    let detector = rt.provide(names::SPIKE_MARKER_SOURCE, share(ThresholdDetector::new(0.5)));
    let catalog = rt.provide(names::SPIKE_SOURCE, share(WaveformCatalog::new(4)));
    let browser = share(SpikeBrowser::new());

    // wire the graph by resolving each component's slots
    typed_mut::<ThresholdDetector>(&detector)
        .unwrap()
        .source
        .resolve(&detector, &mut rt)
        .expect("detector needs a signal source");
    {
        let mut catalog_mut = typed_mut::<WaveformCatalog>(&catalog).unwrap();
        catalog_mut
            .signal
            .resolve(&catalog, &mut rt)
            .expect("catalog needs a signal source");
        catalog_mut
            .markers
            .resolve(&catalog, &mut rt)
            .expect("catalog needs spike markers");
    }
    {
        let mut browser_mut = typed_mut::<SpikeBrowser>(&browser).unwrap();
        browser_mut
            .waves
            .resolve(&browser, &mut rt)
            .expect("browser needs waveforms");
        // no LabelSource is bound; the optional slot reports absence
        let labels = browser_mut
            .labels
            .resolve(&browser, &mut rt)
            .expect("label lookup must not fail");
        assert!(labels.is_none());
    }

    info!(
        components = rt.component_count(),
        edges = rt.edge_count(),
        sampling_rate = typed::<Recording>(&recording).unwrap().sampling_rate as f64,
        "pipeline wired"
    );

    // two acquisition rounds, each followed by one update wave
    for round in 0..2u32 {
        typed_mut::<Recording>(&recording)
            .unwrap()
            .acquire([0.1, 0.9, 0.2, 0.05, 0.7, 0.3]);

        let visited = rt.update(&recording);
        info!(round, visited, "propagated signal change");
    }

    let browser_state = typed::<SpikeBrowser>(&browser).unwrap();
    let catalog_state = typed::<WaveformCatalog>(&catalog).unwrap();
    println!(
        "browser refreshed {} times over {} waveforms",
        browser_state.refreshes,
        catalog_state.waveforms.len()
    );
}
