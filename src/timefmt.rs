use chrono::{NaiveDate, TimeZone, Utc};

/// Format a millisecond timestamp as UTC string, or return a placeholder on error.
pub fn format_timestamp(ts_millis: i64) -> String {
    match Utc.timestamp_millis_opt(ts_millis) {
        chrono::LocalResult::Single(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => "invalid timestamp".to_string(),
    }
}

/// Format an optional millisecond timestamp, using '-' when missing.
pub fn format_timestamp_opt(ts: Option<i64>) -> String {
    ts.map(format_timestamp).unwrap_or_else(|| "-".to_string())
}

/// Long date used for the peak day ("Jun 10, 2024"), or "N/A" when there is none.
pub fn format_peak_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Short chart label ("Jun 10").
pub fn format_chart_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1_718_010_000_000), "2024-06-10 09:00:00");
        assert_eq!(format_timestamp_opt(None), "-");
    }

    #[test]
    fn test_format_peak_date() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1);
        assert_eq!(format_peak_date(date), "Jun 1, 2024");
        assert_eq!(format_peak_date(None), "N/A");
    }

    #[test]
    fn test_format_chart_label() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert_eq!(format_chart_label(date), "Dec 25");
    }
}
