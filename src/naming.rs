//! Deterministic local file names for selected verdicts

use chrono::{DateTime, NaiveDate};

/// Extension used when none can be inferred
pub const DEFAULT_EXTENSION: &str = "pdf";

/// File name for the `index`-th selected verdict of a run on `date`
///
/// ```
/// use chrono::NaiveDate;
/// use verdict_dl::naming::file_name;
///
/// let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
/// assert_eq!(file_name(7, date), "case_007_2025-10-01.pdf");
/// ```
pub fn file_name(index: usize, date: NaiveDate) -> String {
    file_name_with_extension(index, date, DEFAULT_EXTENSION)
}

/// Same as [`file_name`] with an explicit extension
pub fn file_name_with_extension(index: usize, date: NaiveDate, extension: &str) -> String {
    format!("case_{:03}_{}.{}", index, date.format("%Y-%m-%d"), extension)
}

/// Lowercase extension of `name`, or [`DEFAULT_EXTENSION`] when there is no usable one
pub fn infer_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// Parse a .NET JSON date (`/Date(1696118400000)/`) into a UTC calendar date
///
/// An optional timezone suffix (`/Date(1696118400000+0300)/`) is ignored; the
/// millisecond value is already UTC.
pub fn parse_dotnet_date(value: &str) -> Option<NaiveDate> {
    let inner = value
        .trim()
        .strip_prefix("/Date(")?
        .strip_suffix(")/")?;

    // Keep the sign of the timestamp, drop any trailing +hhmm / -hhmm offset
    let digits_end = inner
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')
        .map(|(i, _)| i)
        .unwrap_or(inner.len());

    let millis: i64 = inner[..digits_end].parse().ok()?;
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}
