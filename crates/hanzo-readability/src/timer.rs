//! Wall-clock timing of a single extraction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Start, end and elapsed time of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    pub duration: Duration,
}

/// Scope guard started at the beginning of a run.
///
/// [`RunTimer::stop`] consumes the guard, so a run can only be timed once.
#[derive(Debug)]
pub struct RunTimer {
    start_ts: DateTime<Utc>,
    started: Instant,
}

impl RunTimer {
    pub fn start() -> Self {
        Self {
            start_ts: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn stop(self) -> Timing {
        let duration = self.started.elapsed();
        let end_ts = self.start_ts
            + chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
        Timing {
            start_ts: self.start_ts,
            end_ts,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_records_ordered_timestamps() {
        let timer = RunTimer::start();
        std::thread::sleep(Duration::from_millis(10));
        let timing = timer.stop();

        assert!(timing.duration >= Duration::from_millis(10));
        assert!(timing.end_ts >= timing.start_ts);
        assert_eq!(
            (timing.end_ts - timing.start_ts).to_std().unwrap(),
            timing.duration
        );
    }
}
