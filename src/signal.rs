//! Signal-appearance timer for new-device detection.
//!
//! When a previously-unseen bin appears, the physical signal output is
//! activated immediately and held for a fixed duration. Each new appearance
//! restarts the hold window; at most one deactivation deadline is pending at
//! any time.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Default hold duration for the signal output after a new appearance.
pub const DEFAULT_SIGNAL_APPEARANCE_MILLISECONDS: u64 = 5000;

/// Capability for driving the physical signal output.
///
/// The production implementation invokes an external command; tests
/// substitute a recording stub.
pub trait SignalOutput: Send + Sync + 'static {
    /// Set the output active (`true`) or inactive (`false`).
    fn set(&self, active: bool);
}

/// Drives the signal output by spawning an external executable with two
/// positional arguments: the channel index and the state (`1` or `0`).
///
/// Invocation is fire-and-forget; the command's outcome is not observed.
pub struct ProcessSignalOutput {
    command: String,
    channel: u32,
}

impl ProcessSignalOutput {
    pub fn new(command: impl Into<String>, channel: u32) -> Self {
        Self {
            command: command.into(),
            channel,
        }
    }
}

impl SignalOutput for ProcessSignalOutput {
    fn set(&self, active: bool) {
        let state = if active { "1" } else { "0" };
        let result = tokio::process::Command::new(&self.command)
            .arg(self.channel.to_string())
            .arg(state)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match result {
            Ok(_) => {
                tracing::debug!("Signal output channel {} set to {}", self.channel, state);
            }
            Err(e) => {
                tracing::debug!("Could not spawn signal command {}: {}", self.command, e);
            }
        }
    }
}

/// Handle to the signal-appearance timer task.
///
/// Dropping the handle stops the task; an active output is deactivated on
/// the way out.
pub struct SignalAppearance {
    trigger_tx: mpsc::UnboundedSender<()>,
}

impl SignalAppearance {
    /// Spawn the timer task with the given output and hold duration.
    pub fn spawn(output: Arc<dyn SignalOutput>, hold: Duration) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_timer(output, hold, trigger_rx));
        Self { trigger_tx }
    }

    /// Report a new-device appearance.
    ///
    /// Activates the output immediately and restarts the hold window; the
    /// latest trigger always wins.
    pub fn trigger(&self) {
        let _ = self.trigger_tx.send(());
    }
}

async fn run_timer(
    output: Arc<dyn SignalOutput>,
    hold: Duration,
    mut trigger_rx: mpsc::UnboundedReceiver<()>,
) {
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            trigger = trigger_rx.recv() => match trigger {
                Some(()) => {
                    // Activation is idempotent; the deadline always resets
                    // to the full hold duration.
                    output.set(true);
                    deadline = Some(Instant::now() + hold);
                }
                None => break,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                output.set(false);
                deadline = None;
            }
        }
    }

    if deadline.is_some() {
        output.set(false);
    }
}
