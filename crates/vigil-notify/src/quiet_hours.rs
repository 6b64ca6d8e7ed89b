use chrono::{DateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::effective::QuietHours;

/// True if `now` falls inside the configured quiet-hours window, evaluated in
/// the window's own timezone. A window that wraps past midnight (`start >
/// end`, e.g. 22-6) is handled the same as one that doesn't.
pub fn is_quiet(quiet_hours: &QuietHours, now: DateTime<Utc>) -> bool {
    let tz: Tz = match quiet_hours.tz.parse() {
        Ok(tz) => tz,
        Err(_) => {
            tracing::warn!(tz = %quiet_hours.tz, "unknown quiet-hours timezone, treating as UTC");
            Tz::UTC
        }
    };
    let local = tz.from_utc_datetime(&now.naive_utc());
    let hour = local.hour() as u8;

    if quiet_hours.start_hour <= quiet_hours.end_hour {
        hour >= quiet_hours.start_hour && hour < quiet_hours.end_hour
    } else {
        hour >= quiet_hours.start_hour || hour < quiet_hours.end_hour
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_inside_same_day_window_is_quiet() {
        let qh = QuietHours { start_hour: 22, end_hour: 23, tz: "UTC".into() };
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 22, 30, 0).unwrap();
        assert!(is_quiet(&qh, now));
    }

    #[test]
    fn hour_outside_window_is_not_quiet() {
        let qh = QuietHours { start_hour: 22, end_hour: 23, tz: "UTC".into() };
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        assert!(!is_quiet(&qh, now));
    }

    #[test]
    fn wrapping_window_spans_midnight() {
        let qh = QuietHours { start_hour: 22, end_hour: 6, tz: "UTC".into() };
        let late = Utc.with_ymd_and_hms(2026, 1, 1, 23, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2026, 1, 1, 3, 0, 0).unwrap();
        let midday = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        assert!(is_quiet(&qh, late));
        assert!(is_quiet(&qh, early));
        assert!(!is_quiet(&qh, midday));
    }
}
