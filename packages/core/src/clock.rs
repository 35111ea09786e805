// ABOUTME: Time source abstraction for services that stamp dates
// ABOUTME: System clock for production, fixed clock for deterministic tests

use chrono::{DateTime, NaiveDate, Utc};

use crate::types::BillingMonth;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn current_month(&self) -> BillingMonth {
        BillingMonth::from_date(self.today())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Noon UTC on the given day
    pub fn on(date: NaiveDate) -> Self {
        let noon = date
            .and_hms_opt(12, 0, 0)
            .unwrap_or_default()
            .and_utc();
        Self(noon)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_month() {
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2026, 2, 3).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 2, 3).unwrap());
        assert_eq!(clock.current_month().to_string(), "2026-02");
    }
}
