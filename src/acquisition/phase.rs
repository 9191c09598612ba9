//! Acquisition phases and the allowed transitions between them.

use std::fmt;
use std::time::Duration;

use super::MAX_PRE_RECORDING_POLL;

/// Where a run currently is. Exactly one phase is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Averaging ambient light before the source is switched on
    Baseline,
    /// Threshold known, waiting for the reading to cross it
    AwaitingOnset,
    /// First 30 s after onset; establishes the reference level
    SamplingWindow,
    /// Recording and tracking output relative to the reference
    MainRecording,
    /// Output at or below the termination percentage, grace period running
    TerminationCheck,
    /// Run finished
    Done,
}

impl Phase {
    /// Whether ticks in this phase write a sample.
    pub fn is_recording(self) -> bool {
        matches!(
            self,
            Phase::SamplingWindow | Phase::MainRecording | Phase::TerminationCheck
        )
    }

    /// Transition table.
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Baseline, AwaitingOnset)
                | (AwaitingOnset, SamplingWindow)
                | (SamplingWindow, MainRecording)
                | (MainRecording, TerminationCheck)
                | (MainRecording, Done)
                | (TerminationCheck, MainRecording)
                | (TerminationCheck, Done)
        )
    }

    /// Delay before the next tick.
    ///
    /// Before and during the sampling window the wait is capped so onset is
    /// caught quickly even with a long recording interval.
    pub fn poll_delay(self, configured: Duration) -> Duration {
        match self {
            Phase::Baseline | Phase::AwaitingOnset | Phase::SamplingWindow => {
                configured.min(MAX_PRE_RECORDING_POLL)
            }
            Phase::MainRecording | Phase::TerminationCheck | Phase::Done => configured,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Baseline => "Baseline",
            Phase::AwaitingOnset => "AwaitingOnset",
            Phase::SamplingWindow => "SamplingWindow",
            Phase::MainRecording => "MainRecording",
            Phase::TerminationCheck => "TerminationCheck",
            Phase::Done => "Done",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Phase; 6] = [
        Phase::Baseline,
        Phase::AwaitingOnset,
        Phase::SamplingWindow,
        Phase::MainRecording,
        Phase::TerminationCheck,
        Phase::Done,
    ];

    #[test]
    fn test_done_is_terminal() {
        for next in ALL {
            assert!(!Phase::Done.can_transition_to(next));
        }
    }

    #[test]
    fn test_baseline_is_never_reentered() {
        for from in ALL {
            assert!(!from.can_transition_to(Phase::Baseline));
        }
    }

    #[test]
    fn test_recording_phases() {
        let recording: Vec<Phase> = ALL.into_iter().filter(|p| p.is_recording()).collect();
        assert_eq!(
            recording,
            [
                Phase::SamplingWindow,
                Phase::MainRecording,
                Phase::TerminationCheck
            ]
        );
    }

    #[test]
    fn test_poll_delay_capped_before_recording() {
        let slow = Duration::from_secs(10);
        assert_eq!(Phase::Baseline.poll_delay(slow), Duration::from_millis(500));
        assert_eq!(Phase::SamplingWindow.poll_delay(slow), Duration::from_millis(500));
        assert_eq!(Phase::MainRecording.poll_delay(slow), slow);

        let fast = Duration::from_millis(100);
        assert_eq!(Phase::AwaitingOnset.poll_delay(fast), fast);
    }
}
