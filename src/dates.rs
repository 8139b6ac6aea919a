//! Date handling for worksheet cells
//!
//! The worksheet holds dates as `dd/mm/yyyy` strings. Loading is lenient and
//! day-first; edit-time resolution is strict and governed by [`EditDatePolicy`].

use chrono::{Local, NaiveDate};
use tracing::warn;

use crate::error::{HerdbookError, HerdbookResult};
use crate::types::CellValue;

/// Format written to the worksheet
pub const DATE_FORMAT: &str = "%d/%m/%Y";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a loaded cell using day-first interpretation.
///
/// Accepts `d/m/y`, `d-m-y` and `d.m.y` with one or two digit day and month,
/// ISO `yyyy-mm-dd` (and `yyyy/mm/dd`), and any of these followed by a time
/// part. Two digit years pivot at 69 (`68` is 2068, `69` is 1969).
/// Returns `None` for anything that is not a real calendar date.
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or("");

    let sep = date_part.chars().find(|c| matches!(c, '/' | '-' | '.'))?;
    let parts: Vec<&str> = date_part.split(sep).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let num = |s: &str| s.parse::<u32>().ok();

    if parts[0].len() == 4 {
        // Year first: unambiguous, never day-first
        let year = parts[0].parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, num(parts[1])?, num(parts[2])?);
    }

    if parts[0].len() > 2 || parts[1].len() > 2 {
        return None;
    }
    let year = match parts[2].len() {
        2 => {
            let yy = parts[2].parse::<i32>().ok()?;
            if yy < 69 {
                2000 + yy
            } else {
                1900 + yy
            }
        }
        4 => parts[2].parse::<i32>().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, num(parts[1])?, num(parts[0])?)
}

/// Strict `dd/mm/yyyy` parse used when resolving edit fields
pub fn parse_strict(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// What to do with an edit-time date that cannot be parsed.
///
/// Empty fields always resolve to today. The policy only decides the fate of
/// non-empty text that is not a `dd/mm/yyyy` date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditDatePolicy {
    /// Substitute today's date and log a warning
    #[default]
    FallbackToToday,
    /// Refuse the edit with [`HerdbookError::InvalidDate`]
    Reject,
}

/// Resolve a date field for editing.
///
/// `Date` values are used as is. Text is parsed as `dd/mm/yyyy`; on failure
/// the policy applies. Empty cells become `today`.
pub fn resolve_edit_date(
    value: &CellValue,
    policy: EditDatePolicy,
    today: NaiveDate,
) -> HerdbookResult<NaiveDate> {
    match value {
        CellValue::Date(date) => Ok(*date),
        CellValue::Text(raw) if !raw.trim().is_empty() => match parse_strict(raw) {
            Some(date) => Ok(date),
            None => match policy {
                EditDatePolicy::FallbackToToday => {
                    warn!(value = %raw, substitute = %format_date(today), "unparseable edit date, using today");
                    Ok(today)
                }
                EditDatePolicy::Reject => Err(HerdbookError::InvalidDate(format!(
                    "'{}' is not a dd/mm/yyyy date",
                    raw
                ))),
            },
        },
        _ => Ok(today),
    }
}
