use chrono::{DateTime, Duration, Utc};

/// Decides when the subscribed coin list is reloaded from the database.
///
/// The first reload is due at construction. Due times stay on the cadence
/// set by the first one: a reload advances the next due time by whole
/// periods, never resetting it to "now + period".
#[derive(Debug, Clone)]
pub struct CoinListSchedule {
    next_due: DateTime<Utc>,
    period: Duration,
}

impl CoinListSchedule {
    pub fn new(start: DateTime<Utc>, period: Duration) -> Self {
        Self {
            next_due: start,
            period,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_due
    }

    pub fn next_due(&self) -> DateTime<Utc> {
        self.next_due
    }

    pub fn mark_refreshed(&mut self, now: DateTime<Utc>) {
        if self.period <= Duration::zero() {
            self.next_due = now;
            return;
        }
        while self.next_due <= now {
            self.next_due += self.period;
        }
    }
}
