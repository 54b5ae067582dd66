use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// This is the standard way of converting a date to a string in routinely. Graph points and
/// alert ids are labeled with it.
pub fn date_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Calendar day of a moment as seen in `tz`.
pub fn local_date<Tz: TimeZone>(moment: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    moment.with_timezone(tz).date_naive()
}

pub fn format_duration_ms(ms: u64) -> String {
    let seconds = ms / 1000;
    if seconds >= 3600 {
        format!("{}h{}m{}s", seconds / 3600, (seconds / 60) % 60, seconds % 60)
    } else if seconds >= 60 {
        format!("{}m{}s", (seconds / 60) % 60, seconds % 60)
    } else {
        format!("{}s", seconds % 60)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};

    use super::{date_label, format_duration_ms, local_date};

    #[test]
    fn test_local_date_crosses_midnight() {
        let moment = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(local_date(moment, &Utc), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(local_date(moment, &tokyo), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_date_label() {
        assert_eq!(date_label(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()), "2024-03-05");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(999), "0s");
        assert_eq!(format_duration_ms(61_000), "1m1s");
        assert_eq!(format_duration_ms(3_725_000), "1h2m5s");
    }
}
