use std::cmp::Ordering;

use modelkit_data::query::{FieldFilter, MatchMode, OrderBy, SortOrder, WhereInput};
use modelkit_data::Value;

use crate::Record;

/// Evaluate `filter` against one row the way a SQL engine would.
///
/// Missing columns read as NULL, and NULL never compares equal or ordered to
/// anything. Nested paths are looked up by their dotted key (`"user.email"`).
pub fn matches(record: &Record, filter: &WhereInput) -> bool {
    let fields = filter
        .fields()
        .iter()
        .all(|(column, f)| field_matches(lookup(record, column), f));
    let and = filter
        .and
        .as_ref()
        .map_or(true, |all| all.iter().all(|w| matches(record, w)));
    let or = filter
        .or
        .as_ref()
        .map_or(true, |any| any.iter().any(|w| matches(record, w)));
    let not = filter.not.as_ref().map_or(true, |w| !matches(record, w));
    fields && and && or && not
}

/// Ordering of two rows under `order`. NULLs sort last ascending and first
/// descending.
pub fn compare_records(a: &Record, b: &Record, order: &OrderBy) -> Ordering {
    for clause in order.clauses() {
        let key = clause.path.join(".");
        let (x, y) = (lookup(a, &key), lookup(b, &key));
        let ord = match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => x.partial_compare(y).unwrap_or(Ordering::Equal),
        };
        let ord = match clause.direction {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn lookup<'a>(record: &'a Record, column: &str) -> &'a Value {
    record.get(column).unwrap_or(&Value::Null)
}

fn same(value: &Value, other: &Value) -> bool {
    value.partial_compare(other) == Some(Ordering::Equal)
}

fn field_matches(value: &Value, filter: &FieldFilter) -> bool {
    if let Some(expected) = &filter.equals {
        let ok = if expected.is_null() {
            value.is_null()
        } else {
            same(value, expected)
        };
        if !ok {
            return false;
        }
    }
    if let Some(excluded) = &filter.not {
        let ok = if excluded.is_null() {
            !value.is_null()
        } else {
            !value.is_null() && !same(value, excluded)
        };
        if !ok {
            return false;
        }
    }
    let bounds: [(&Option<Value>, fn(Ordering) -> bool); 4] = [
        (&filter.gt, Ordering::is_gt),
        (&filter.gte, Ordering::is_ge),
        (&filter.lt, Ordering::is_lt),
        (&filter.lte, Ordering::is_le),
    ];
    for (bound, accept) in bounds {
        if let Some(bound) = bound {
            if !value.partial_compare(bound).is_some_and(accept) {
                return false;
            }
        }
    }
    if let Some(list) = &filter.in_list {
        if !list.iter().any(|candidate| same(value, candidate)) {
            return false;
        }
    }
    if let Some(needle) = &filter.contains {
        let Some(haystack) = value.as_str() else {
            return false;
        };
        let found = match filter.mode {
            MatchMode::Default => haystack.contains(needle.as_str()),
            MatchMode::Insensitive => haystack.to_lowercase().contains(&needle.to_lowercase()),
        };
        if !found {
            return false;
        }
    }
    true
}
