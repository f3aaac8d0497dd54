use time::{Date, OffsetDateTime};

/// Source of "now"/"today" for the aggregation layer. Injected so tests can pin
/// the calendar to a fixed day instead of reading the host clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    fn today(&self) -> Date {
        self.now().date()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
