//! Builders for the predicate fragments callers most often need: keyword
//! search, a date window on one column, and interval overlap on a start/end
//! column pair.
//!
//! Every builder returns `None` when there is nothing to filter on, so results
//! can be fed straight into [`merge_where`](super::merge_where).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::filter::{FieldFilter, MatchMode, WhereInput};
use crate::error::DomainError;

/// One `contains` condition per column.
///
/// The caller decides how they combine, typically `WhereInput::any(..)`.
/// Returns `None` for an empty keyword or an empty column list.
pub fn keyword_input(fields: &[&str], keyword: &str, mode: MatchMode) -> Option<Vec<WhereInput>> {
    if keyword.is_empty() || fields.is_empty() {
        return None;
    }
    Some(
        fields
            .iter()
            .map(|field| WhereInput::new().field(field, FieldFilter::contains(keyword, mode)))
            .collect(),
    )
}

/// `{field: {gte: start, lte: end}}` with whichever bounds are present.
pub fn single_date_time_input(
    field: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Option<WhereInput> {
    if start.is_none() && end.is_none() {
        return None;
    }
    let filter = FieldFilter {
        gte: start.map(Into::into),
        lte: end.map(Into::into),
        ..FieldFilter::default()
    };
    Some(WhereInput::new().field(field, filter))
}

/// Rows whose `[start_column, end_column]` interval overlaps `[start, end]`.
///
/// A NULL `end_column` means the row is still ongoing, so it satisfies every
/// "ends after" test.
pub fn date_time_range_input(
    start_column: &str,
    end_column: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Option<WhereInput> {
    let branches = match (start, end) {
        (None, None) => return None,
        (Some(start), Some(end)) => vec![
            WhereInput::new()
                .field(start_column, FieldFilter::default().lte(end))
                .field(end_column, FieldFilter::default().gte(start)),
            WhereInput::new()
                .field(start_column, FieldFilter::default().lte(end))
                .field(end_column, FieldFilter::is_null()),
        ],
        (None, Some(end)) => vec![WhereInput::new().field(start_column, FieldFilter::default().lte(end))],
        (Some(start), None) => vec![
            WhereInput::new().field(end_column, FieldFilter::default().gte(start)),
            WhereInput::new().field(end_column, FieldFilter::is_null()),
        ],
    };
    Some(WhereInput::any(branches))
}

/// Parse a date bound for the builders above.
///
/// RFC 3339 input keeps its offset. A timestamp or a bare date without offset
/// is read as UTC, never as host-local time.
pub fn parse_utc_bound(input: &str) -> Result<DateTime<Utc>, DomainError> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(DomainError::invalid_argument(format!(
        "`{input}` is not a valid date or timestamp"
    )))
}
