use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::{self, BorrowedFormatItem};
use time::{Date, Duration, Month, UtcOffset, Weekday};

use crate::{UtcDateTime, ValidationError};

/// Venezuela has observed UTC-4 year-round since 2016.
pub const CARACAS_UTC_OFFSET_HOURS: i8 = -4;

static DAY_FORMAT: LazyLock<Vec<BorrowedFormatItem<'static>>> = LazyLock::new(|| {
    format_description::parse("[year]-[month]-[day]").expect("day format description is valid")
});

fn caracas_offset() -> UtcOffset {
    UtcOffset::from_hms(CARACAS_UTC_OFFSET_HOURS, 0, 0).unwrap_or(UtcOffset::UTC)
}

/// Calendar day in Caracas local time, rendered as `YYYY-MM-DD`.
///
/// Rate history is keyed by this day so observations at 23:00 and 01:00 local time land
/// on different days even when they share a UTC date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(Date);

impl DayKey {
    pub fn caracas_today() -> Self {
        Self::in_caracas(UtcDateTime::now())
    }

    pub fn in_caracas(instant: UtcDateTime) -> Self {
        Self(instant.into_inner().to_offset(caracas_offset()).date())
    }

    pub const fn from_date(date: Date) -> Self {
        Self(date)
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), DAY_FORMAT.as_slice())
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    pub const fn date(self) -> Date {
        self.0
    }

    pub fn minus_days(self, days: i64) -> Self {
        self.0
            .checked_sub(Duration::days(days))
            .map(Self)
            .unwrap_or(Self(Date::MIN))
    }

    pub fn plus_days(self, days: i64) -> Self {
        self.0
            .checked_add(Duration::days(days))
            .map(Self)
            .unwrap_or(Self(Date::MAX))
    }

    /// First day of this day's month.
    pub fn month_start(self) -> Self {
        self.0.replace_day(1).map(Self).unwrap_or(self)
    }

    /// Most recent Sunday on or before this day.
    pub fn week_start(self) -> Self {
        let offset = i64::from(self.0.weekday().number_days_from_sunday());
        self.minus_days(offset)
    }

    /// Same day-of-month `months` earlier, clamped to the end of shorter months and to
    /// [`Date::MIN`] when the result falls outside the supported calendar.
    pub fn minus_months(self, months: u32) -> Self {
        let total = i64::from(self.0.year()) * 12 + i64::from(u8::from(self.0.month())) - 1
            - i64::from(months);
        let Ok(year) = i32::try_from(total.div_euclid(12)) else {
            return Self(Date::MIN);
        };
        let Ok(month) = Month::try_from((total.rem_euclid(12) + 1) as u8) else {
            return self;
        };
        (28..=self.0.day().max(28))
            .rev()
            .map(|day| day.min(self.0.day()))
            .find_map(|day| Date::from_calendar_date(year, month, day).ok())
            .map(Self)
            .unwrap_or(Self(Date::MIN))
    }

    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }
}

impl Display for DayKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl FromStr for DayKey {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for DayKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(value: &str) -> DayKey {
        DayKey::parse(value).expect("valid day")
    }

    #[test]
    fn caracas_day_lags_utc_after_midnight() {
        let late_utc = UtcDateTime::parse("2025-03-10T02:30:00Z").expect("parse");
        let afternoon_utc = UtcDateTime::parse("2025-03-10T15:00:00Z").expect("parse");

        assert_eq!(DayKey::in_caracas(late_utc).to_string(), "2025-03-09");
        assert_eq!(DayKey::in_caracas(afternoon_utc).to_string(), "2025-03-10");
    }

    #[test]
    fn rejects_malformed_days() {
        for input in ["2025-3-09", "09/03/2025", "2025-02-30", "2025-03-09-01", ""] {
            assert!(DayKey::parse(input).is_err(), "{input} should be rejected");
        }
    }

    #[test]
    fn day_arithmetic_crosses_month_and_year_boundaries() {
        assert_eq!(day("2025-03-01").minus_days(1).to_string(), "2025-02-28");
        assert_eq!(day("2024-12-31").plus_days(1).to_string(), "2025-01-01");
        assert_eq!(day("2025-03-31").minus_months(1).to_string(), "2025-02-28");
        assert_eq!(day("2025-01-15").minus_months(2).to_string(), "2024-11-15");
        assert_eq!(day("2025-03-19").month_start().to_string(), "2025-03-01");
    }

    #[test]
    fn month_offsets_past_the_calendar_clamp_to_the_earliest_day() {
        let today = day("2025-03-12");

        assert_eq!(today.minus_months(u32::MAX), DayKey::from_date(Date::MIN));
        assert_eq!(today.minus_months(2_147_483_648), DayKey::from_date(Date::MIN));
        assert_eq!(today.minus_months(150_000), DayKey::from_date(Date::MIN));
    }

    #[test]
    fn surrounding_whitespace_is_ignored_when_parsing() {
        assert_eq!(day(" 2025-03-09 ").to_string(), "2025-03-09");
    }

    #[test]
    fn weeks_start_on_sunday() {
        // 2025-03-12 is a Wednesday.
        assert_eq!(day("2025-03-12").week_start().to_string(), "2025-03-09");
        assert_eq!(day("2025-03-09").week_start().to_string(), "2025-03-09");
    }
}
