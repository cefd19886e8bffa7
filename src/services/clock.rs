use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::errors::ServiceError;

/// Injected time source for the rental pipelines.
///
/// `now` feeds the temporal validation rules; `local_to_utc` normalizes
/// caller-local time windows to the canonical UTC representation before they
/// are validated and persisted. Injectable so tests can freeze time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn local_to_utc(&self, local: NaiveDateTime) -> DateTime<Utc>;
}

/// Clock for deployments that already hand the core UTC wall times.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        Utc.from_utc_datetime(&local)
    }
}

/// Clock with a fixed UTC offset, built from the configured
/// `utc_offset_minutes`.
#[derive(Clone, Copy, Debug)]
pub struct FixedOffsetClock {
    offset: FixedOffset,
}

impl FixedOffsetClock {
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, ServiceError> {
        let offset = FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
            ServiceError::InvalidInput(format!("invalid UTC offset: {} minutes", minutes))
        })?;
        Ok(Self { offset })
    }
}

impl Clock for FixedOffsetClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        // A fixed offset maps every local time to exactly one instant.
        match self.offset.from_local_datetime(&local).single() {
            Some(instant) => instant.with_timezone(&Utc),
            None => Utc.from_utc_datetime(&local),
        }
    }
}
