//! The date window used for per-account transaction pulls.

use crate::error::{ProtocolError, ProtocolResult};
use chrono::{Months, NaiveDate};

/// Date format expected by the server for window parameters.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// An inclusive day-granularity range of transaction dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullWindow {
    /// First day included.
    pub start: NaiveDate,
    /// Last day included.
    pub end: NaiveDate,
}

impl PullWindow {
    /// Builds the window ending `today` and starting `months` calendar months
    /// earlier. Days past the end of a shorter month clamp to its last day.
    pub fn trailing(today: NaiveDate, months: u32) -> ProtocolResult<Self> {
        if months == 0 {
            return Err(ProtocolError::InvalidWindow(
                "window must span at least one month".into(),
            ));
        }
        let start = today
            .checked_sub_months(Months::new(months))
            .ok_or_else(|| {
                ProtocolError::InvalidWindow(format!("{} minus {} months", today, months))
            })?;
        Ok(Self { start, end: today })
    }

    /// Returns true if `date` falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Query parameters for the windowed transaction listing.
    pub fn query(&self) -> Vec<(String, String)> {
        vec![
            (
                "start_date".to_string(),
                self.start.format(WIRE_DATE_FORMAT).to_string(),
            ),
            (
                "end_date".to_string(),
                self.end.format(WIRE_DATE_FORMAT).to_string(),
            ),
        ]
    }

    /// Parses the window back out of query parameters.
    pub fn from_query(params: &[(String, String)]) -> ProtocolResult<Self> {
        let get = |name: &str| -> ProtocolResult<NaiveDate> {
            let raw = params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
                .ok_or_else(|| ProtocolError::InvalidWindow(format!("missing {}", name)))?;
            NaiveDate::parse_from_str(raw, WIRE_DATE_FORMAT)
                .map_err(|e| ProtocolError::InvalidWindow(format!("{}: {}", name, e)))
        };
        let window = Self {
            start: get("start_date")?,
            end: get("end_date")?,
        };
        if window.start > window.end {
            return Err(ProtocolError::InvalidWindow(
                "start_date is after end_date".into(),
            ));
        }
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn three_month_window() {
        let window = PullWindow::trailing(date(2026, 10, 14), 3).unwrap();
        assert_eq!(window.start, date(2026, 7, 14));
        assert_eq!(window.end, date(2026, 10, 14));
        assert!(window.contains(date(2026, 7, 14)));
        assert!(window.contains(date(2026, 10, 14)));
        assert!(!window.contains(date(2026, 7, 13)));
    }

    #[test]
    fn clamps_to_month_end() {
        let window = PullWindow::trailing(date(2026, 5, 31), 3).unwrap();
        assert_eq!(window.start, date(2026, 2, 28));
    }

    #[test]
    fn zero_months_rejected() {
        assert!(PullWindow::trailing(date(2026, 1, 1), 0).is_err());
    }

    #[test]
    fn query_format() {
        let window = PullWindow::trailing(date(2026, 3, 5), 3).unwrap();
        assert_eq!(
            window.query(),
            vec![
                ("start_date".to_string(), "2025-12-05".to_string()),
                ("end_date".to_string(), "2026-03-05".to_string()),
            ]
        );
        assert_eq!(PullWindow::from_query(&window.query()).unwrap(), window);
    }

    #[test]
    fn inverted_query_rejected() {
        let params = vec![
            ("start_date".to_string(), "2026-03-05".to_string()),
            ("end_date".to_string(), "2026-03-01".to_string()),
        ];
        assert!(PullWindow::from_query(&params).is_err());
    }

    proptest! {
        #[test]
        fn window_is_bounded(days in 0i64..40_000, months in 1u32..=24) {
            let today = date(1990, 1, 1) + chrono::Duration::days(days);
            let window = PullWindow::trailing(today, months).unwrap();
            prop_assert!(window.start <= window.end);
            prop_assert_eq!(window.end, today);
            let span = (window.end - window.start).num_days();
            prop_assert!(span >= i64::from(months) * 28);
            prop_assert!(span <= i64::from(months) * 31);
        }
    }
}
