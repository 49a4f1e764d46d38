use crate::value::Value;

/// How `contains` compares text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Whatever the storage engine does by default (case-sensitive on Postgres).
    #[default]
    Default,
    Insensitive,
}

/// Conditions on a single column. Every populated condition must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldFilter {
    pub equals: Option<Value>,
    pub not: Option<Value>,
    pub gt: Option<Value>,
    pub gte: Option<Value>,
    pub lt: Option<Value>,
    pub lte: Option<Value>,
    pub in_list: Option<Vec<Value>>,
    pub contains: Option<String>,
    pub mode: MatchMode,
}

impl FieldFilter {
    pub fn equals(value: impl Into<Value>) -> Self {
        Self {
            equals: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn is_null() -> Self {
        Self::equals(Value::Null)
    }

    pub fn is_not_null() -> Self {
        Self {
            not: Some(Value::Null),
            ..Self::default()
        }
    }

    pub fn contains(text: impl Into<String>, mode: MatchMode) -> Self {
        Self {
            contains: Some(text.into()),
            mode,
            ..Self::default()
        }
    }

    pub fn one_of(values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self {
            in_list: Some(values.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn gt(mut self, value: impl Into<Value>) -> Self {
        self.gt = Some(value.into());
        self
    }

    pub fn gte(mut self, value: impl Into<Value>) -> Self {
        self.gte = Some(value.into());
        self
    }

    pub fn lt(mut self, value: impl Into<Value>) -> Self {
        self.lt = Some(value.into());
        self
    }

    pub fn lte(mut self, value: impl Into<Value>) -> Self {
        self.lte = Some(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == FieldFilter::default()
    }
}

/// A typed predicate: column conditions plus optional `AND` / `OR` / `NOT` composites.
///
/// All populated parts are combined with AND. Column conditions keep their
/// insertion order so rendered SQL is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereInput {
    fields: Vec<(String, FieldFilter)>,
    pub and: Option<Vec<WhereInput>>,
    pub or: Option<Vec<WhereInput>>,
    pub not: Option<Box<WhereInput>>,
}

impl WhereInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter for `column`, replacing any previous one.
    pub fn field(mut self, column: &str, filter: FieldFilter) -> Self {
        self.set_field(column, filter);
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.field(column, FieldFilter::equals(value))
    }

    pub fn set_field(&mut self, column: &str, filter: FieldFilter) {
        match self.fields.iter_mut().find(|(c, _)| c == column) {
            Some(entry) => entry.1 = filter,
            None => self.fields.push((column.to_string(), filter)),
        }
    }

    pub fn fields(&self) -> &[(String, FieldFilter)] {
        &self.fields
    }

    pub fn get(&self, column: &str) -> Option<&FieldFilter> {
        self.fields.iter().find(|(c, _)| c == column).map(|(_, f)| f)
    }

    /// Disjunction of `branches`.
    pub fn any(branches: Vec<WhereInput>) -> Self {
        Self {
            or: Some(branches),
            ..Self::default()
        }
    }

    /// Conjunction of `branches`.
    pub fn all(branches: Vec<WhereInput>) -> Self {
        Self {
            and: Some(branches),
            ..Self::default()
        }
    }

    pub fn negate(inner: WhereInput) -> Self {
        Self {
            not: Some(Box::new(inner)),
            ..Self::default()
        }
    }

    /// True when nothing would be filtered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.and.is_none() && self.or.is_none() && self.not.is_none()
    }

    /// Shallow merge: keys present in `other` win, both for columns and for
    /// the `and` / `or` / `not` composites.
    pub fn merge(mut self, other: WhereInput) -> Self {
        for (column, filter) in other.fields {
            self.set_field(&column, filter);
        }
        if other.and.is_some() {
            self.and = other.and;
        }
        if other.or.is_some() {
            self.or = other.or;
        }
        if other.not.is_some() {
            self.not = other.not;
        }
        self
    }
}

/// Where a fragment is being merged into: a single predicate, or a list of
/// predicates that will later be wrapped in `AND` / `OR`.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereTarget {
    Single(WhereInput),
    List(Vec<WhereInput>),
}

impl Default for WhereTarget {
    fn default() -> Self {
        WhereTarget::Single(WhereInput::default())
    }
}

/// Merge an optional fragment into `target`.
///
/// A single target is shallow-merged (later keys win); a list target gets the
/// fragment appended so nested disjunctions stay intact. `None` is a no-op.
pub fn merge_where(target: &mut WhereTarget, fragment: Option<WhereInput>) {
    let Some(fragment) = fragment else {
        return;
    };
    match target {
        WhereTarget::Single(current) => {
            let merged = std::mem::take(current).merge(fragment);
            *current = merged;
        }
        WhereTarget::List(list) => list.push(fragment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_later_keys_win() {
        let base = WhereInput::new().eq("status", "draft").eq("author", 1);
        let merged = base.merge(WhereInput::new().eq("status", "published"));
        assert_eq!(merged.fields().len(), 2);
        assert_eq!(
            merged.get("status"),
            Some(&FieldFilter::equals("published"))
        );
        assert_eq!(merged.fields()[0].0, "status");
    }

    #[test]
    fn merge_replaces_composites() {
        let base = WhereInput::any(vec![WhereInput::new().eq("a", 1)]);
        let merged = base.merge(WhereInput::any(vec![WhereInput::new().eq("b", 2)]));
        assert_eq!(merged.or.unwrap()[0].get("b"), Some(&FieldFilter::equals(2)));
    }

    #[test]
    fn merge_where_appends_to_lists() {
        let mut target = WhereTarget::List(vec![WhereInput::new().eq("a", 1)]);
        merge_where(&mut target, Some(WhereInput::new().eq("b", 2)));
        merge_where(&mut target, None);
        match target {
            WhereTarget::List(list) => assert_eq!(list.len(), 2),
            WhereTarget::Single(_) => panic!("target changed shape"),
        }
    }

    #[test]
    fn merge_where_merges_single_targets() {
        let mut target = WhereTarget::Single(WhereInput::new().eq("a", 1));
        merge_where(&mut target, Some(WhereInput::new().eq("a", 2).eq("b", 3)));
        assert_eq!(
            target,
            WhereTarget::Single(WhereInput::new().eq("a", 2).eq("b", 3))
        );
    }
}
