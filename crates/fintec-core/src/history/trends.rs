use serde::{Deserialize, Serialize};

/// Moves smaller than this many percent count as stable.
pub const STABLE_THRESHOLD_PERCENT: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Change between two observations of the same rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTrend {
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub change_percent: f64,
    pub direction: TrendDirection,
}

impl RateTrend {
    /// Compare `current` against `previous`; every figure is rounded to cents.
    pub fn between(current: f64, previous: f64) -> Self {
        let change = current - previous;
        let change_percent = if previous == 0.0 {
            0.0
        } else {
            change / previous * 100.0
        };

        let direction = if change_percent.abs() < STABLE_THRESHOLD_PERCENT {
            TrendDirection::Stable
        } else if change > 0.0 {
            TrendDirection::Up
        } else {
            TrendDirection::Down
        };

        Self {
            current: round_to_cents(current),
            previous: round_to_cents(previous),
            change: round_to_cents(change),
            change_percent: round_to_cents(change_percent),
            direction,
        }
    }
}

/// Today against yesterday.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTrends {
    pub usd: RateTrend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eur: Option<RateTrend>,
}

/// Oldest against newest USD observation in trailing windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodTrends {
    #[serde(rename = "1d")]
    pub one_day: Option<RateTrend>,
    #[serde(rename = "1w")]
    pub one_week: Option<RateTrend>,
    #[serde(rename = "1m")]
    pub one_month: Option<RateTrend>,
}

impl PeriodTrends {
    pub fn is_empty(&self) -> bool {
        self.one_day.is_none() && self.one_week.is_none() && self.one_month.is_none()
    }
}

pub(crate) fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_follows_the_stable_threshold() {
        assert_eq!(RateTrend::between(100.05, 100.0).direction, TrendDirection::Stable);
        assert_eq!(RateTrend::between(100.2, 100.0).direction, TrendDirection::Up);
        assert_eq!(RateTrend::between(99.8, 100.0).direction, TrendDirection::Down);
    }

    #[test]
    fn figures_are_rounded_to_cents() {
        let trend = RateTrend::between(65.123, 64.0);

        assert_eq!(trend.current, 65.12);
        assert_eq!(trend.previous, 64.0);
        assert_eq!(trend.change, 1.12);
        assert_eq!(trend.change_percent, 1.75);
    }

    #[test]
    fn zero_previous_value_reports_no_percentage() {
        let trend = RateTrend::between(10.0, 0.0);
        assert_eq!(trend.change_percent, 0.0);
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn period_keys_serialize_as_short_labels() {
        let trends = PeriodTrends {
            one_day: Some(RateTrend::between(2.0, 1.0)),
            one_week: None,
            one_month: None,
        };
        let json = serde_json::to_value(trends).expect("serialize");

        assert_eq!(json["1d"]["direction"], "up");
        assert!(json["1w"].is_null());
        assert!(!trends.is_empty());
    }
}
