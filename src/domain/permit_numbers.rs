//! Permit number format helpers.
//!
//! Issued permits are numbered `<YY><MM><NNNNNN>`: two-digit year,
//! two-digit month, six-digit zero-padded sequence. The sequence is
//! shared across building and occupancy permits within a year-month.

use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

const PERIOD_FORMAT: &[FormatItem<'static>] =
    format_description!("[year repr:last_two][month padding:zero]");

pub const SEQUENCE_DIGITS: usize = 6;

/// Render the YYMM period key for a point in time.
pub fn period_key_for(timestamp: OffsetDateTime) -> String {
    timestamp.date().format(PERIOD_FORMAT).expect("valid period key")
}

/// Compose a permit number from a period key and a sequence value.
pub fn format_permit_number(period_key: &str, sequence: u32) -> String {
    format!("{period_key}{sequence:0width$}", width = SEQUENCE_DIGITS)
}

/// Extract the sequence value from a permit number belonging to
/// `period_key`. Returns `None` for numbers from other periods or with a
/// malformed tail.
pub fn sequence_of(permit_number: &str, period_key: &str) -> Option<u32> {
    let tail = permit_number.strip_prefix(period_key)?;
    if tail.len() != SEQUENCE_DIGITS || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

/// The next sequence value given the highest already issued in the
/// period, defaulting to 1 when the period is empty.
pub fn next_sequence(highest_existing: Option<u32>) -> u32 {
    highest_existing.map_or(1, |seq| seq + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn period_key_is_two_digit_year_and_month() {
        assert_eq!(period_key_for(datetime!(2025-01-15 10:00 UTC)), "2501");
        assert_eq!(period_key_for(datetime!(2026-11-01 00:00 UTC)), "2611");
    }

    #[test]
    fn permit_numbers_are_zero_padded_to_six_digits() {
        assert_eq!(format_permit_number("2501", 7), "2501000007");
        assert_eq!(format_permit_number("2501", 123_456), "2501123456");
    }

    #[test]
    fn sequence_parses_only_matching_periods() {
        assert_eq!(sequence_of("2501000007", "2501"), Some(7));
        assert_eq!(sequence_of("2412000007", "2501"), None);
        assert_eq!(sequence_of("2501xyz007", "2501"), None);
        assert_eq!(sequence_of("250100007", "2501"), None);
    }

    #[test]
    fn sequence_starts_at_one_and_increments_past_the_max() {
        assert_eq!(next_sequence(None), 1);
        assert_eq!(next_sequence(Some(41)), 42);
    }
}
