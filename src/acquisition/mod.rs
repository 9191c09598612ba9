//! Phase-driven acquisition of a light source's warm-up and decay.
//!
//! A run moves through a fixed sequence of [`Phase`]s:
//!
//! ```text
//! Baseline ─► AwaitingOnset ─► SamplingWindow ─► MainRecording ◄──► TerminationCheck
//!                                                     │                  │
//!                                                     └──────► Done ◄────┘
//! ```
//!
//! - **Baseline**: five readings of ambient light; the onset threshold is three
//!   times their mean
//! - **AwaitingOnset**: blink the ready indicator until a reading reaches the threshold
//! - **SamplingWindow**: record for 30 s; the reading at the close becomes the
//!   reference level
//! - **MainRecording**: record, report progress relative to the reference
//! - **TerminationCheck**: output is at or below the target, stop unless it
//!   recovers within 5 minutes
//!
//! All timing uses `tokio::time`, so a paused test clock drives a full run in
//! milliseconds.

mod context;
mod engine;
mod phase;
mod progress;
mod summary;

pub use context::RunContext;
pub use engine::Acquisition;
pub use phase::Phase;
pub use progress::ProgressThrottle;
pub use summary::{EndReason, RunSummary};

use std::time::Duration;

/// Ambient readings averaged before the run is armed.
pub const BASELINE_SAMPLES: u32 = 5;

/// Onset threshold as a multiple of the baseline mean.
pub const ONSET_FACTOR: f64 = 3.0;

/// Length of the reference sampling window after onset.
pub const SAMPLING_WINDOW: Duration = Duration::from_secs(30);

/// How long output may stay at or below the target before the run stops.
pub const TERMINATION_GRACE: Duration = Duration::from_secs(5 * 60);

/// Longest wait between ticks before recording proper begins.
pub const MAX_PRE_RECORDING_POLL: Duration = Duration::from_millis(500);
