use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = DomainError;

    /// Case-sensitive: only `asc` and `desc` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(DomainError::invalid_argument(format!(
                "invalid sort direction `{other}`, expected `asc` or `desc`"
            ))),
        }
    }
}

impl Serialize for SortOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One sort key. A multi-segment path sorts through nested relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByClause {
    pub path: Vec<String>,
    pub direction: SortOrder,
}

impl OrderByClause {
    pub fn new(column: &str, direction: SortOrder) -> Self {
        Self {
            path: column.split('.').map(str::to_string).collect(),
            direction,
        }
    }

    pub fn is_nested(&self) -> bool {
        self.path.len() > 1
    }

    /// The right-nested mapping form, e.g. `{"user":{"email":"desc"}}`.
    pub fn to_json(&self) -> serde_json::Value {
        self.path
            .iter()
            .rev()
            .fold(serde_json::Value::from(self.direction.as_str()), |inner, key| {
                let mut map = serde_json::Map::new();
                map.insert(key.clone(), inner);
                serde_json::Value::Object(map)
            })
    }
}

impl Serialize for OrderByClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Nested {
            path: &self.path,
            direction: self.direction,
        }
        .serialize(serializer)
    }
}

struct Nested<'a> {
    path: &'a [String],
    direction: SortOrder,
}

impl Serialize for Nested<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self.path {
            [] => {}
            [last] => map.serialize_entry(last, &self.direction)?,
            [first, rest @ ..] => map.serialize_entry(
                first,
                &Nested {
                    path: rest,
                    direction: self.direction,
                },
            )?,
        }
        map.end()
    }
}

/// An ordered list of sort keys; earlier clauses take priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OrderBy(Vec<OrderByClause>);

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `column[:direction][,column[:direction]...]`.
    ///
    /// `column` may be dot-separated (`user.email`). The direction defaults to
    /// `asc` when omitted.
    ///
    /// ```
    /// use modelkit_data::query::OrderBy;
    ///
    /// let order = OrderBy::parse("name:asc,user.email:desc").unwrap();
    /// assert_eq!(order.clauses()[1].path, vec!["user", "email"]);
    /// ```
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        if input.is_empty() {
            return Err(DomainError::invalid_argument("order by string must not be empty"));
        }
        input
            .split(',')
            .map(parse_clause)
            .collect::<Result<Vec<_>, _>>()
            .map(OrderBy)
    }

    pub fn then(mut self, column: &str, direction: SortOrder) -> Self {
        self.0.push(OrderByClause::new(column, direction));
        self
    }

    pub fn clauses(&self) -> &[OrderByClause] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for OrderBy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderBy::parse(s)
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", clause.path.join("."), clause.direction.as_str())?;
        }
        Ok(())
    }
}

/// `column[:direction]`; anything after a second `:` is ignored.
fn parse_clause(raw: &str) -> Result<OrderByClause, DomainError> {
    let mut parts = raw.trim().split(':').map(str::trim);
    let column = parts.next().unwrap_or_default();
    if column.is_empty() {
        return Err(DomainError::invalid_argument(format!(
            "order by clause `{raw}` has no column"
        )));
    }
    if column.split('.').any(str::is_empty) {
        return Err(DomainError::invalid_argument(format!(
            "order by column `{column}` has an empty path segment"
        )));
    }
    let direction = match parts.next() {
        None | Some("") => SortOrder::Asc,
        Some(token) => token.parse()?,
    };
    Ok(OrderByClause::new(column, direction))
}
