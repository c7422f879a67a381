//! Lookback window for sales velocity.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// A strictly positive number of days.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WindowDays(u32);

/// Why a raw window value was rejected. Always recoverable: callers substitute
/// a default instead of failing the request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidWindow {
    #[error("window_days must be an integer, got {0:?}")]
    Unparsable(String),

    #[error("window_days must be positive, got {0}")]
    NonPositive(i64),

    #[error("window_days is out of range: {0}")]
    OutOfRange(i64),
}

impl WindowDays {
    pub fn new(days: u32) -> Result<Self, InvalidWindow> {
        if days == 0 {
            return Err(InvalidWindow::NonPositive(0));
        }
        Ok(Self(days))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Strict parse of a user-supplied value (e.g. the `days` query parameter).
    pub fn parse(raw: &str) -> Result<Self, InvalidWindow> {
        let trimmed = raw.trim();
        let days: i64 = trimmed
            .parse()
            .map_err(|_| InvalidWindow::Unparsable(trimmed.to_string()))?;
        if days <= 0 {
            return Err(InvalidWindow::NonPositive(days));
        }
        let days = u32::try_from(days).map_err(|_| InvalidWindow::OutOfRange(days))?;
        Ok(Self(days))
    }

    /// Lenient parse: absent or invalid input yields `fallback`.
    pub fn parse_or(raw: Option<&str>, fallback: WindowDays) -> Self {
        let Some(raw) = raw else {
            return fallback;
        };
        match Self::parse(raw) {
            Ok(window) => window,
            Err(e) => {
                tracing::debug!(error = %e, fallback = fallback.get(), "invalid window, using fallback");
                fallback
            }
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::days(i64::from(self.0))
    }

    /// Inclusive lower bound of the window ending at `now`.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.duration())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Default for WindowDays {
    fn default() -> Self {
        Self(DEFAULT_WINDOW_DAYS)
    }
}

impl core::fmt::Display for WindowDays {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}d", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_positive_integers() {
        assert_eq!(WindowDays::parse("7").unwrap().get(), 7);
        assert_eq!(WindowDays::parse(" 45 ").unwrap().get(), 45);
    }

    #[test]
    fn rejects_negative_zero_and_garbage() {
        assert_eq!(WindowDays::parse("-5"), Err(InvalidWindow::NonPositive(-5)));
        assert_eq!(WindowDays::parse("0"), Err(InvalidWindow::NonPositive(0)));
        assert_eq!(
            WindowDays::parse("abc"),
            Err(InvalidWindow::Unparsable("abc".to_string()))
        );
        assert!(matches!(
            WindowDays::parse("99999999999"),
            Err(InvalidWindow::OutOfRange(_))
        ));
    }

    #[test]
    fn lenient_parse_falls_back_to_default() {
        let default = WindowDays::default();
        assert_eq!(WindowDays::parse_or(Some("-5"), default).get(), 30);
        assert_eq!(WindowDays::parse_or(Some("abc"), default).get(), 30);
        assert_eq!(WindowDays::parse_or(Some("1.5"), default).get(), 30);
        assert_eq!(WindowDays::parse_or(None, default).get(), 30);
        assert_eq!(WindowDays::parse_or(Some("14"), default).get(), 14);
    }

    #[test]
    fn start_subtracts_whole_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let window = WindowDays::new(30).unwrap();
        assert_eq!(window.start(now), Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn huge_window_saturates_at_min_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let window = WindowDays::new(u32::MAX).unwrap();
        assert_eq!(window.start(now), DateTime::<Utc>::MIN_UTC);
    }
}
