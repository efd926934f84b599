//! bins-webhook - forwards the identifiers of detected bins to a webhook.
//!
//! Radio-decoding events ("raddecs") stream in from an upstream decoding
//! pipeline; this library accumulates per-transmitter decoding counts, and
//! on each heartbeat POSTs the identifiers of bins decoded often enough to a
//! remote endpoint. Optionally a physical signal output is driven for a
//! fixed hold duration whenever a previously-unseen bin appears.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       bins-webhook                       │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌──────────┐    ┌────────────┐    ┌────────────────┐   │
//! │  │  Raddec  │───▶│ Aggregator │───▶│   Heartbeat    │   │
//! │  │  source  │    │ (counts)   │    │   reporter     │──▶ POST /bins
//! │  └──────────┘    └────────────┘    └────────────────┘   │
//! │                        │                                 │
//! │                        ▼ new device                      │
//! │                  ┌────────────┐                          │
//! │                  │   Signal   │──▶ external command      │
//! │                  │ appearance │                          │
//! │                  └────────────┘                          │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod aggregator;
pub mod config;
pub mod raddec;
pub mod reporter;
pub mod signal;
pub mod source;

// Re-export key types at crate root for convenience
pub use aggregator::{create_shared_aggregator, Aggregator, SharedAggregator};
pub use config::{Config, ConfigError};
pub use raddec::{Raddec, RssiSignatureEntry};
pub use reporter::{BinsReporter, BINS_PATH};
pub use signal::{ProcessSignalOutput, SignalAppearance, SignalOutput};
pub use source::RaddecSource;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
