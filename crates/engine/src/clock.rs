//! Calendar-day source.
//!
//! "Today" is the calendar day in one configured IANA timezone, evaluated on
//! every call; nothing caches it across a day boundary.

use chrono::{Months, NaiveDate, Utc};
use chrono_tz::Tz;

pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Wall clock projected into a fixed timezone.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parses an IANA name such as `Asia/Dhaka`.
    pub fn from_name(name: &str) -> Result<Self, String> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|err| format!("invalid timezone {name}: {err}"))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }
}

/// Clock pinned to one day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// One calendar month ending on `today`, both ends inclusive.
///
/// The start clamps to the end of a shorter month (`03-31` -> `02-29`).
pub fn default_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today.checked_sub_months(Months::new(1)).unwrap_or(today);
    (start, today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_window_is_one_month() {
        assert_eq!(
            default_window(date(2024, 2, 15)),
            (date(2024, 1, 15), date(2024, 2, 15))
        );
        assert_eq!(
            default_window(date(2024, 3, 31)),
            (date(2024, 2, 29), date(2024, 3, 31))
        );
        assert_eq!(
            default_window(date(2024, 1, 10)),
            (date(2023, 12, 10), date(2024, 1, 10))
        );
    }

    #[test]
    fn timezone_names_are_validated() {
        assert!(SystemClock::from_name("Asia/Dhaka").is_ok());
        assert!(SystemClock::from_name("Mars/Olympus").is_err());
    }
}
