//! Minimal run-time metrics sink.
//!
//! No exporter is bundled. Counters emitted through the
//! `metrics` facade are accumulated in a process-wide map that the host can
//! read back with [`snapshot`].

use dashmap::DashMap;
use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static COUNTERS: Lazy<DashMap<String, Arc<AtomicU64>>> = Lazy::new(DashMap::new);

/// Recorder that keeps counters in [`COUNTERS`]; gauges and histograms are
/// dropped.
struct MapRecorder;

#[derive(Clone)]
struct MapCounter {
    cell: Arc<AtomicU64>,
}

impl metrics::CounterFn for MapCounter {
    fn increment(&self, value: u64) {
        self.cell.fetch_add(value, Ordering::Relaxed);
    }
    fn absolute(&self, value: u64) {
        self.cell.fetch_max(value, Ordering::Relaxed);
    }
}

impl Recorder for MapRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        let cell = COUNTERS.entry(key.name().to_string()).or_default();
        Counter::from_arc(Arc::new(MapCounter {
            cell: Arc::clone(&*cell),
        }))
    }
    fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }
    fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

/// Install the recorder exactly **once**. Returns false if some other
/// recorder was already in place.
pub fn init() -> bool {
    static INSTALLED: Lazy<bool> = Lazy::new(|| metrics::set_global_recorder(MapRecorder).is_ok());
    *INSTALLED
}

/// Current value of one counter, zero if it was never touched.
pub fn counter_value(name: &str) -> u64 {
    COUNTERS
        .get(name)
        .map(|c| c.load(Ordering::Relaxed))
        .unwrap_or(0)
}

/// All counters seen so far, sorted by name.
pub fn snapshot() -> Vec<(String, u64)> {
    let mut out: Vec<_> = COUNTERS
        .iter()
        .map(|e| (e.key().clone(), e.value().load(Ordering::Relaxed)))
        .collect();
    out.sort();
    out
}
