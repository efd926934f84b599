//! Per-transmitter decoding-count aggregation between heartbeats.
//!
//! The aggregator accumulates decoding counts per transmitter within the
//! current heartbeat cycle and remembers which transmitters were present in
//! the immediately preceding cycle so that genuinely new devices can be
//! distinguished from returning ones.

use crate::raddec::Raddec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Aggregator shared between the ingest path and the heartbeat reporter.
///
/// `record` and `drain` are mutually exclusive behind the lock; neither holds
/// it across an await point.
pub type SharedAggregator = Arc<Mutex<Aggregator>>;

/// Create a shared aggregator with the given decodings threshold.
pub fn create_shared_aggregator(threshold: u64) -> SharedAggregator {
    Arc::new(Mutex::new(Aggregator::new(threshold)))
}

/// Default minimum number of decodings a bin must strictly exceed to be
/// included in a heartbeat report.
pub const DEFAULT_DECODINGS_THRESHOLD: u64 = 5;

/// Accumulates decoding counts per transmitter within a heartbeat cycle.
///
/// `record` and `drain` are the only entry points; callers that invoke them
/// from different tasks must wrap the aggregator in a mutex so each call is
/// atomic with respect to the other.
pub struct Aggregator {
    /// Accumulated decoding counts for the current cycle
    devices: HashMap<String, u64>,
    /// Transmitter ids present at the end of the previous cycle
    previous_cycle_ids: HashSet<String>,
    /// Report inclusion threshold (strictly-greater-than)
    threshold: u64,
}

impl Aggregator {
    /// Create an aggregator with the given decodings threshold.
    pub fn new(threshold: u64) -> Self {
        Self {
            devices: HashMap::new(),
            previous_cycle_ids: HashSet::new(),
            threshold,
        }
    }

    /// Record a decoding event.
    ///
    /// Returns `true` when the transmitter is a new appearance: first seen
    /// this cycle and absent from the previous cycle's id set. The caller
    /// forwards that to the signal-appearance timer.
    pub fn record(&mut self, raddec: &Raddec) -> bool {
        let delta = raddec.number_of_decodings();

        if let Some(count) = self.devices.get_mut(&raddec.transmitter_id) {
            *count += delta;
            return false;
        }

        let is_new = !self.previous_cycle_ids.contains(&raddec.transmitter_id);
        self.devices.insert(raddec.transmitter_id.clone(), delta);
        is_new
    }

    /// Drain the current cycle.
    ///
    /// Returns the ids whose accumulated count strictly exceeds the
    /// threshold. The previous-cycle id set is replaced by the full key set
    /// regardless of threshold, then the counts are cleared; nothing carries
    /// over to the next cycle.
    pub fn drain(&mut self) -> Vec<String> {
        let bin_identifiers = self
            .devices
            .iter()
            .filter(|&(_, &count)| count > self.threshold)
            .map(|(id, _)| id.clone())
            .collect();

        self.previous_cycle_ids = self.devices.keys().cloned().collect();
        self.devices.clear();

        bin_identifiers
    }

    /// Number of transmitters observed so far this cycle.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}
