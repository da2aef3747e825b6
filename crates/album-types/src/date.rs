//! Capture-date derivation from upload filenames.
//!
//! Cameras and phones commonly name files `YYYYMMDD_...`. When the first
//! eight characters of a filename are digits forming a real calendar date,
//! that date becomes the record's capture date. Anything else falls back to
//! the ingest day. The rule runs once at ingest and is never re-evaluated.

use chrono::NaiveDate;

const PREFIX_LEN: usize = 8;

/// Derive the capture date for a newly ingested file.
///
/// ```
/// use album_types::{captured_date_from_filename, NaiveDate};
///
/// let today = NaiveDate::from_ymd_opt(2025, 10, 11).unwrap();
/// assert_eq!(
///     captured_date_from_filename("20240115_beach.jpg", today),
///     NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
/// );
/// assert_eq!(captured_date_from_filename("photo.jpg", today), today);
/// ```
pub fn captured_date_from_filename(filename: &str, ingest_day: NaiveDate) -> NaiveDate {
    parse_prefix(filename).unwrap_or(ingest_day)
}

fn parse_prefix(filename: &str) -> Option<NaiveDate> {
    let prefix = filename.get(..PREFIX_LEN)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = prefix[..4].parse().ok()?;
    let month: u32 = prefix[4..6].parse().ok()?;
    let day: u32 = prefix[6..8].parse().ok()?;
    if year < 1 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 11).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn valid_prefix_is_used() {
        assert_eq!(
            captured_date_from_filename("20240115_beach.jpg", today()),
            ymd(2024, 1, 15)
        );
        assert_eq!(captured_date_from_filename("20251011.jpg", today()), ymd(2025, 10, 11));
    }

    #[test]
    fn non_date_names_fall_back() {
        assert_eq!(captured_date_from_filename("photo.jpg", today()), today());
        assert_eq!(captured_date_from_filename("IMG_0001.png", today()), today());
    }

    #[test]
    fn short_names_fall_back() {
        assert_eq!(captured_date_from_filename("2024", today()), today());
        assert_eq!(captured_date_from_filename("", today()), today());
    }

    #[test]
    fn impossible_dates_fall_back() {
        assert_eq!(captured_date_from_filename("20241301.jpg", today()), today());
        assert_eq!(captured_date_from_filename("20230229.jpg", today()), today());
        assert_eq!(captured_date_from_filename("00000101.jpg", today()), today());
    }

    #[test]
    fn leap_day_is_accepted() {
        assert_eq!(captured_date_from_filename("20240229x.jpg", today()), ymd(2024, 2, 29));
    }

    #[test]
    fn partial_digits_fall_back() {
        assert_eq!(captured_date_from_filename("2024-01-15.jpg", today()), today());
        assert_eq!(captured_date_from_filename("2024011a.jpg", today()), today());
    }

    #[test]
    fn multibyte_prefix_falls_back() {
        assert_eq!(captured_date_from_filename("2024年01月15日.jpg", today()), today());
        // Byte 8 lands inside a multi-byte character.
        assert_eq!(captured_date_from_filename("2024010年.jpg", today()), today());
    }
}
