use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Returns the calendar date of `at` in the configured timezone.
pub fn local_date(at: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn local_date_shifts_across_midnight() {
        // 23:30 UTC is already the next day in Tokyo (UTC+9).
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 23, 30, 0).unwrap();
        assert_eq!(
            local_date(at, &chrono_tz::Asia::Tokyo),
            NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()
        );
        assert_eq!(
            local_date(at, &chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
    }
}
