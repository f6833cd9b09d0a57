use chrono::{Local, NaiveDateTime, TimeDelta};

/// Local wall-clock time source for the scheduler.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Wall time derived from tokio's clock, so it follows `tokio::time::pause`/`advance`.
pub struct MonotonicClock {
    origin_wall: NaiveDateTime,
    origin: tokio::time::Instant,
}

impl MonotonicClock {
    pub fn starting_at(wall: NaiveDateTime) -> Self {
        Self {
            origin_wall: wall,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> NaiveDateTime {
        TimeDelta::from_std(self.origin.elapsed())
            .ok()
            .and_then(|elapsed| self.origin_wall.checked_add_signed(elapsed))
            .unwrap_or(NaiveDateTime::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn monotonic_clock_follows_tokio_time() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let clock = MonotonicClock::starting_at(start);
        assert_eq!(clock.now(), start);

        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(clock.now(), start + TimeDelta::seconds(90));
    }
}
