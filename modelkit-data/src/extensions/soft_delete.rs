use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::accessor::{ModelAccessor, WriteArgs};
use crate::error::{DataError, DomainError};
use crate::query::{FieldFilter, WhereInput};
use crate::value::{Data, Value};

pub const DEFAULT_COLUMN: &str = "deletedAt";

/// Storage type of the soft-delete marker column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoftDeleteColumnType {
    /// Writes the deletion timestamp.
    #[default]
    Date,
    /// Writes `1`.
    Number,
    /// Writes `false`, for "active"-style flags.
    Boolean,
}

impl SoftDeleteColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            SoftDeleteColumnType::Date => "date",
            SoftDeleteColumnType::Number => "number",
            SoftDeleteColumnType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for SoftDeleteColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoftDeleteColumnType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SoftDeleteColumnType::Date),
            "number" => Ok(SoftDeleteColumnType::Number),
            "boolean" => Ok(SoftDeleteColumnType::Boolean),
            other => Err(DomainError::invalid_argument(format!(
                "unknown soft delete column type `{other}`, expected date, number or boolean"
            ))),
        }
    }
}

/// Which column marks a row as deleted, and what to write into it.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftDeleteSpec {
    pub column_name: String,
    pub column_type: SoftDeleteColumnType,
    /// Written as-is when present, whatever `column_type` says.
    pub column_value: Option<Value>,
}

impl Default for SoftDeleteSpec {
    fn default() -> Self {
        Self {
            column_name: DEFAULT_COLUMN.to_string(),
            column_type: SoftDeleteColumnType::default(),
            column_value: None,
        }
    }
}

impl SoftDeleteSpec {
    pub fn new(column_name: &str, column_type: SoftDeleteColumnType) -> Self {
        Self {
            column_name: column_name.to_string(),
            column_type,
            column_value: None,
        }
    }

    /// Build from loosely typed settings; an unknown type name is rejected.
    pub fn from_parts(column_name: &str, column_type: &str) -> Result<Self, DomainError> {
        Ok(Self::new(column_name, column_type.parse()?))
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.column_value = Some(value.into());
        self
    }

    /// The single-column mutation that marks a row deleted at `now`.
    pub fn data(&self, now: DateTime<Utc>) -> Data {
        let value = match (&self.column_value, self.column_type) {
            (Some(explicit), _) => explicit.clone(),
            (None, SoftDeleteColumnType::Date) => Value::DateTime(now),
            (None, SoftDeleteColumnType::Number) => Value::Int(1),
            (None, SoftDeleteColumnType::Boolean) => Value::Bool(false),
        };
        Data::new().set(&self.column_name, value)
    }

    /// Filter for rows that are not soft-deleted.
    ///
    /// Read paths opt into this themselves; the delete primitives never apply it.
    /// The default markers assume a live row holds `NULL` (date), `0` (number)
    /// or `true` (boolean). With an explicit value, any row whose column is
    /// `NULL` or differs from that value counts as live.
    pub fn live_filter(&self) -> WhereInput {
        let live = match (&self.column_value, self.column_type) {
            (Some(deleted), _) => {
                return WhereInput::any(vec![
                    WhereInput::new().field(&self.column_name, FieldFilter::is_null()),
                    WhereInput::new().field(
                        &self.column_name,
                        FieldFilter {
                            not: Some(deleted.clone()),
                            ..FieldFilter::default()
                        },
                    ),
                ]);
            }
            (None, SoftDeleteColumnType::Boolean) => Value::Bool(true),
            (None, SoftDeleteColumnType::Number) => Value::Int(0),
            (None, SoftDeleteColumnType::Date) => Value::Null,
        };
        WhereInput::new().eq(&self.column_name, live)
    }
}

/// Mark the first row matching `filter` as deleted and return it.
pub async fn soft_delete<M: ModelAccessor>(
    accessor: &M,
    filter: WhereInput,
    spec: &SoftDeleteSpec,
) -> Result<M::Row, DataError> {
    let args = WriteArgs::new(filter, spec.data(Utc::now()));
    accessor.update(&args).await
}

/// Mark every row matching `filter` as deleted, returning how many were.
pub async fn soft_delete_many<M: ModelAccessor>(
    accessor: &M,
    filter: WhereInput,
    spec: &SoftDeleteSpec,
) -> Result<u64, DataError> {
    let args = WriteArgs::new(filter, spec.data(Utc::now()));
    accessor.update_many(&args).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn type_defaults() {
        let spec = SoftDeleteSpec::default();
        assert_eq!(spec.data(now()).get("deletedAt"), Some(&Value::DateTime(now())));

        let spec = SoftDeleteSpec::new("deleted", SoftDeleteColumnType::Number);
        assert_eq!(spec.data(now()).get("deleted"), Some(&Value::Int(1)));

        let spec = SoftDeleteSpec::new("active", SoftDeleteColumnType::Boolean);
        assert_eq!(spec.data(now()).get("active"), Some(&Value::Bool(false)));
    }

    #[test]
    fn explicit_value_wins() {
        let spec = SoftDeleteSpec::new("deleted", SoftDeleteColumnType::Number).value(5);
        let data = spec.data(now());
        assert_eq!(data.len(), 1);
        assert_eq!(data.get("deleted"), Some(&Value::Int(5)));

        let spec = SoftDeleteSpec::new("deletedAt", SoftDeleteColumnType::Date).value("gone");
        assert_eq!(spec.data(now()).get("deletedAt"), Some(&Value::from("gone")));
    }

    #[test]
    fn unknown_type_is_invalid_argument() {
        let err = SoftDeleteSpec::from_parts("deletedAt", "timestamp").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            SoftDeleteSpec::from_parts("flag", "boolean").unwrap().column_type,
            SoftDeleteColumnType::Boolean
        );
    }

    #[test]
    fn live_filter_matches_type() {
        assert_eq!(
            SoftDeleteSpec::default().live_filter(),
            WhereInput::new().eq("deletedAt", Value::Null)
        );
        assert_eq!(
            SoftDeleteSpec::new("active", SoftDeleteColumnType::Boolean).live_filter(),
            WhereInput::new().eq("active", true)
        );
    }

    #[test]
    fn live_filter_with_explicit_value_excludes_only_that_value() {
        let filter = SoftDeleteSpec::new("status", SoftDeleteColumnType::Number)
            .value(9)
            .live_filter();
        let branches = filter.or.expect("explicit value builds an OR");
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0], WhereInput::new().field("status", FieldFilter::is_null()));
        assert_eq!(branches[1].get("status").and_then(|f| f.not.clone()), Some(Value::Int(9)));
    }
}
