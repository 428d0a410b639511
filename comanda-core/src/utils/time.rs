//! 时间工具函数 — 业务时区与 ISO 日期

use chrono::NaiveDate;
use chrono_tz::Tz;

/// Parse an ISO date string (YYYY-MM-DD); whitespace is tolerated
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// Today as the 8-digit `YYYYMMDD` number used in order identifiers
/// (business timezone)
pub fn today_yyyymmdd(tz: Tz) -> u32 {
    chrono::Utc::now()
        .with_timezone(&tz)
        .format("%Y%m%d")
        .to_string()
        .parse()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        assert_eq!(
            parse_date(" 2024-06-15 "),
            NaiveDate::from_ymd_opt(2024, 6, 15)
        );
        assert_eq!(parse_date("15/06/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn today_is_eight_digits() {
        let today = today_yyyymmdd(chrono_tz::Europe::Madrid);
        assert!(today >= 20_240_101);
        assert!(today <= 99_991_231);
    }
}
