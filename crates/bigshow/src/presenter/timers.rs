use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

/// Presenter displays refresh once a second.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A periodic deadline. Missed periods are skipped, not replayed.
#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    next: Instant,
    period: Duration,
}

impl Ticker {
    pub fn starting_at(start: Instant, period: Duration) -> Self {
        Self {
            next: start + period,
            period,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.next
    }

    pub fn due(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        while self.next <= now {
            self.next += self.period;
        }
        true
    }
}

/// `MM:SS`; minutes keep counting past an hour.
pub fn elapsed_label(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Local wall-clock time as `HH:MM`.
pub fn clock_label(now: DateTime<Local>) -> String {
    now.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_elapsed_label() {
        assert_eq!(elapsed_label(Duration::ZERO), "00:00");
        assert_eq!(elapsed_label(Duration::from_millis(65_900)), "01:05");
        assert_eq!(elapsed_label(Duration::from_secs(3725)), "62:05");
    }

    #[test]
    fn test_clock_label() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 4, 59).unwrap();
        assert_eq!(clock_label(at), "07:04");
    }

    #[test]
    fn test_ticker_fires_once_per_period() {
        let t0 = Instant::now();
        let mut ticker = Ticker::starting_at(t0, TICK_PERIOD);
        assert!(!ticker.due(t0 + Duration::from_millis(999)));
        assert!(ticker.due(t0 + Duration::from_secs(1)));
        assert!(!ticker.due(t0 + Duration::from_millis(1500)));
        assert!(ticker.due(t0 + Duration::from_millis(4500)));
        assert_eq!(ticker.deadline(), t0 + Duration::from_secs(5));
    }
}
