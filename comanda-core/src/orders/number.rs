//! Order identifier generation
//!
//! Identifiers are `O{YYYYMMDD}{counter:04}`: lexicographically sortable
//! with a per-day sequence. The generator is a plain stateful value
//! constructed once at startup and seeded from the store's historical
//! maximum (see [`crate::db::repository::sequence_state`]), so the
//! sequence survives restarts and deletions of the most recent orders.

use chrono_tz::Tz;
use std::cmp::Ordering;

use crate::utils::time;

/// Parse `O{8-digit date}{4-digit counter}` into its numeric parts
pub fn parse_order_id(id: &str) -> Option<(u32, u32)> {
    let rest = id.trim().strip_prefix('O')?;
    if rest.len() != 12 || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let date = rest[..8].parse().ok()?;
    let counter = rest[8..].parse().ok()?;
    Some((date, counter))
}

/// Compare two identifiers: date part first, then daily sequence, both
/// numeric. Malformed identifiers compare equal, which callers treat as
/// "keep the incumbent".
pub fn compare_order_ids(a: &str, b: &str) -> Ordering {
    match (parse_order_id(a), parse_order_id(b)) {
        (Some(left), Some(right)) => left.cmp(&right),
        _ => Ordering::Equal,
    }
}

/// Daily order-number generator
#[derive(Debug)]
pub struct OrderNumberGenerator {
    last_date: Option<u32>,
    counter: u32,
    /// 业务时区 — 序号按此时区的日期滚动
    tz: Tz,
}

impl OrderNumberGenerator {
    pub fn new(tz: Tz) -> Self {
        Self {
            last_date: None,
            counter: 0,
            tz,
        }
    }

    /// Seed from a previously issued identifier. Malformed or absent
    /// input is ignored: a fresh counter beats guessing at unparseable
    /// history.
    pub fn seed_from(&mut self, order_id: Option<&str>) {
        if let Some((date, counter)) = order_id.and_then(parse_order_id) {
            self.last_date = Some(date);
            self.counter = counter;
        }
    }

    /// Next identifier for today (business timezone)
    pub fn next(&mut self) -> String {
        self.next_on(time::today_yyyymmdd(self.tz))
    }

    fn next_on(&mut self, today: u32) -> String {
        if self.last_date != Some(today) {
            self.last_date = Some(today);
            self.counter = 1;
        } else {
            self.counter += 1;
        }
        // Past 9999 the field widens; no wraparound
        format!("O{today:08}{:04}", self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> OrderNumberGenerator {
        OrderNumberGenerator::new(chrono_tz::Europe::Madrid)
    }

    #[test]
    fn same_day_sequence_is_strictly_increasing() {
        let mut generator = generator();
        assert_eq!(generator.next_on(20_240_615), "O202406150001");
        assert_eq!(generator.next_on(20_240_615), "O202406150002");
        assert_eq!(generator.next_on(20_240_615), "O202406150003");
    }

    #[test]
    fn date_change_resets_the_counter() {
        let mut generator = generator();
        generator.next_on(20_240_615);
        generator.next_on(20_240_615);
        assert_eq!(generator.next_on(20_240_616), "O202406160001");
    }

    #[test]
    fn seeding_continues_the_sequence() {
        let mut generator = generator();
        generator.seed_from(Some("O202406150042"));
        assert_eq!(generator.next_on(20_240_615), "O202406150043");
    }

    #[test]
    fn malformed_seed_is_ignored() {
        let mut generator = generator();
        generator.seed_from(Some("not-an-id"));
        generator.seed_from(Some("O2024061542"));
        generator.seed_from(None);
        assert_eq!(generator.next_on(20_240_615), "O202406150001");
    }

    #[test]
    fn counter_widens_past_9999() {
        let mut generator = generator();
        generator.seed_from(Some("O202406159999"));
        assert_eq!(generator.next_on(20_240_615), "O2024061510000");
    }

    #[test]
    fn parse_and_compare() {
        assert_eq!(parse_order_id("O202406150007"), Some((20_240_615, 7)));
        assert_eq!(parse_order_id(" O202406150007 "), Some((20_240_615, 7)));
        assert_eq!(parse_order_id("X202406150007"), None);
        assert_eq!(parse_order_id("O20240615007"), None);

        assert_eq!(
            compare_order_ids("O202406150007", "O202406150008"),
            Ordering::Less
        );
        assert_eq!(
            compare_order_ids("O202406160001", "O202406159999"),
            Ordering::Greater
        );
        assert_eq!(
            compare_order_ids("garbage", "O202406150001"),
            Ordering::Equal
        );
    }
}
