//! SQL rendering for the typed query arguments.
//!
//! ```ignore
//! let q = QueryBuilder::new("posts", Dialect::Postgres)
//!     .id_column("id")
//!     .columns(&["id", "title"]);
//! let stmt = q.select(&FindManyArgs::new().filter(WhereInput::new().eq("title", "a")).take(10))?;
//! assert_eq!(stmt.sql, r#"SELECT "id", "title" FROM "posts" WHERE "title" = $1 LIMIT 10"#);
//! ```

use crate::accessor::{CreateArgs, FindManyArgs, UniqueArgs, WriteArgs};
use crate::entity::Entity;
use crate::error::DomainError;
use crate::query::filter::{FieldFilter, MatchMode, WhereInput};
use crate::query::order_by::{OrderBy, SortOrder};
use crate::value::{Data, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// SQLite-style `?` placeholders.
    Sqlite,
    /// Postgres-style `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite => "?".to_string(),
        }
    }

    fn quote_char(self) -> char {
        '"'
    }
}

/// A rendered statement and its bind values, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    id_column: String,
    columns: Vec<String>,
    dialect: Dialect,
}

impl QueryBuilder {
    pub fn new(table: &str, dialect: Dialect) -> Self {
        Self {
            table: table.to_string(),
            id_column: "id".to_string(),
            columns: Vec::new(),
            dialect,
        }
    }

    /// Builder pre-configured from an entity's table metadata.
    pub fn for_entity<T: Entity>(dialect: Dialect) -> Self {
        Self::new(T::table_name(), dialect)
            .id_column(T::id_column())
            .columns(T::columns())
    }

    pub fn id_column(mut self, column: &str) -> Self {
        self.id_column = column.to_string();
        self
    }

    /// Default projection; an empty list selects `*`.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn count(&self, filter: Option<&WhereInput>) -> Result<Statement, DomainError> {
        let mut out = SqlWriter::new(self.dialect);
        out.push(&format!("SELECT COUNT(*) FROM {}", self.table_ident()?));
        self.append_where(filter, &mut out)?;
        Ok(out.finish())
    }

    pub fn select(&self, args: &FindManyArgs) -> Result<Statement, DomainError> {
        let mut out = SqlWriter::new(self.dialect);
        out.push(&format!(
            "SELECT {} FROM {}",
            self.projection(args.select.as_deref())?,
            self.table_ident()?
        ));
        self.append_where(args.filter.as_ref(), &mut out)?;
        self.append_order(&args.order_by, &mut out)?;
        self.append_limit_offset(args.take, args.skip, &mut out);
        Ok(out.finish())
    }

    /// `select` capped at one row.
    pub fn select_first(&self, args: &FindManyArgs) -> Result<Statement, DomainError> {
        let mut args = args.clone();
        args.take = Some(1);
        self.select(&args)
    }

    pub fn select_unique(&self, args: &UniqueArgs) -> Result<Statement, DomainError> {
        let mut out = SqlWriter::new(self.dialect);
        out.push(&format!(
            "SELECT {} FROM {}",
            self.projection(args.select.as_deref())?,
            self.table_ident()?
        ));
        self.append_where(Some(&args.filter), &mut out)?;
        out.push(" LIMIT 1");
        Ok(out.finish())
    }

    pub fn insert(&self, args: &CreateArgs) -> Result<Statement, DomainError> {
        let mut out = SqlWriter::new(self.dialect);
        let table = self.table_ident()?;
        if args.data.is_empty() {
            out.push(&format!("INSERT INTO {table} DEFAULT VALUES"));
        } else {
            let columns = args
                .data
                .iter()
                .map(|(c, _)| self.ident(c))
                .collect::<Result<Vec<_>, _>>()?;
            out.push(&format!("INSERT INTO {table} ({}) VALUES (", columns.join(", ")));
            for (i, (_, value)) in args.data.iter().enumerate() {
                if i > 0 {
                    out.push(", ");
                }
                out.push_value(value);
            }
            out.push(")");
        }
        out.push(&format!(
            " RETURNING {}",
            self.projection(args.select.as_deref())?
        ));
        Ok(out.finish())
    }

    /// Update the first row matching the filter, returning it.
    pub fn update_one(&self, args: &WriteArgs) -> Result<Statement, DomainError> {
        if args.filter.is_empty() {
            return Err(DomainError::invalid_argument("update requires a filter"));
        }
        let mut out = SqlWriter::new(self.dialect);
        out.push(&format!("UPDATE {} SET ", self.table_ident()?));
        self.append_assignments(&args.data, &mut out)?;
        self.append_single_row_target(&args.filter, &mut out)?;
        out.push(&format!(" RETURNING {}", self.projection(None)?));
        Ok(out.finish())
    }

    pub fn update_many(&self, args: &WriteArgs) -> Result<Statement, DomainError> {
        let mut out = SqlWriter::new(self.dialect);
        out.push(&format!("UPDATE {} SET ", self.table_ident()?));
        self.append_assignments(&args.data, &mut out)?;
        self.append_where(Some(&args.filter), &mut out)?;
        Ok(out.finish())
    }

    /// Delete the first row matching the filter, returning it.
    pub fn delete_one(&self, args: &UniqueArgs) -> Result<Statement, DomainError> {
        if args.filter.is_empty() {
            return Err(DomainError::invalid_argument("delete requires a filter"));
        }
        let mut out = SqlWriter::new(self.dialect);
        out.push(&format!("DELETE FROM {}", self.table_ident()?));
        self.append_single_row_target(&args.filter, &mut out)?;
        out.push(&format!(
            " RETURNING {}",
            self.projection(args.select.as_deref())?
        ));
        Ok(out.finish())
    }

    fn table_ident(&self) -> Result<String, DomainError> {
        format_identifier_checked(&self.table, self.dialect, false, "table")
    }

    fn ident(&self, column: &str) -> Result<String, DomainError> {
        format_identifier_checked(column, self.dialect, false, "column")
    }

    fn projection(&self, select: Option<&[String]>) -> Result<String, DomainError> {
        let columns: Vec<&str> = match select {
            Some(cols) => cols.iter().map(String::as_str).collect(),
            None => self.columns.iter().map(String::as_str).collect(),
        };
        if columns.is_empty() {
            return Ok("*".to_string());
        }
        let mut out = Vec::with_capacity(columns.len());
        for col in columns {
            out.push(format_identifier_checked(col, self.dialect, true, "column")?);
        }
        Ok(out.join(", "))
    }

    fn append_assignments(&self, data: &Data, out: &mut SqlWriter) -> Result<(), DomainError> {
        if data.is_empty() {
            return Err(DomainError::invalid_argument("update requires at least one column"));
        }
        for (i, (column, value)) in data.iter().enumerate() {
            if i > 0 {
                out.push(", ");
            }
            out.push(&format!("{} = ", self.ident(column)?));
            out.push_value(value);
        }
        Ok(())
    }

    fn append_single_row_target(
        &self,
        filter: &WhereInput,
        out: &mut SqlWriter,
    ) -> Result<(), DomainError> {
        let id = self.ident(&self.id_column)?;
        out.push(&format!(
            " WHERE {id} = (SELECT {id} FROM {}",
            self.table_ident()?
        ));
        self.append_where(Some(filter), out)?;
        out.push(" LIMIT 1)");
        Ok(())
    }

    fn append_where(&self, filter: Option<&WhereInput>, out: &mut SqlWriter) -> Result<(), DomainError> {
        match filter {
            Some(filter) if !filter.is_empty() => {
                out.push(" WHERE ");
                self.write_predicate(filter, out)
            }
            _ => Ok(()),
        }
    }

    fn write_predicate(&self, filter: &WhereInput, out: &mut SqlWriter) -> Result<(), DomainError> {
        let mut first = true;
        for (column, field) in filter.fields() {
            let column = self.ident(column)?;
            self.write_field(&column, field, out, &mut first);
        }
        if let Some(and) = &filter.and {
            separate(out, &mut first);
            self.write_group(and, " AND ", "1 = 1", out)?;
        }
        if let Some(or) = &filter.or {
            separate(out, &mut first);
            self.write_group(or, " OR ", "1 = 0", out)?;
        }
        if let Some(not) = &filter.not {
            separate(out, &mut first);
            out.push("NOT (");
            self.write_predicate(not, out)?;
            out.push(")");
        }
        if first {
            out.push("1 = 1");
        }
        Ok(())
    }

    fn write_group(
        &self,
        branches: &[WhereInput],
        joiner: &str,
        when_empty: &str,
        out: &mut SqlWriter,
    ) -> Result<(), DomainError> {
        out.push("(");
        if branches.is_empty() {
            out.push(when_empty);
        }
        for (i, branch) in branches.iter().enumerate() {
            if i > 0 {
                out.push(joiner);
            }
            out.push("(");
            self.write_predicate(branch, out)?;
            out.push(")");
        }
        out.push(")");
        Ok(())
    }

    fn write_field(&self, col: &str, field: &FieldFilter, out: &mut SqlWriter, first: &mut bool) {
        if let Some(value) = &field.equals {
            separate(out, first);
            if value.is_null() {
                out.push(&format!("{col} IS NULL"));
            } else {
                out.push(&format!("{col} = "));
                out.push_value(value);
            }
        }
        if let Some(value) = &field.not {
            separate(out, first);
            if value.is_null() {
                out.push(&format!("{col} IS NOT NULL"));
            } else {
                out.push(&format!("{col} <> "));
                out.push_value(value);
            }
        }
        for (op, bound) in [
            (">", &field.gt),
            (">=", &field.gte),
            ("<", &field.lt),
            ("<=", &field.lte),
        ] {
            if let Some(value) = bound {
                separate(out, first);
                out.push(&format!("{col} {op} "));
                out.push_value(value);
            }
        }
        if let Some(values) = &field.in_list {
            separate(out, first);
            if values.is_empty() {
                out.push("1 = 0");
            } else {
                out.push(&format!("{col} IN ("));
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push(", ");
                    }
                    out.push_value(value);
                }
                out.push(")");
            }
        }
        if let Some(text) = &field.contains {
            separate(out, first);
            match (self.dialect, field.mode) {
                (Dialect::Sqlite, MatchMode::Default) => {
                    // SQLite's LIKE folds ASCII case
                    out.push(&format!("instr({col}, "));
                    out.push_value(&Value::Text(text.clone()));
                    out.push(") > 0");
                }
                (dialect, mode) => {
                    let op = match (dialect, mode) {
                        (Dialect::Postgres, MatchMode::Insensitive) => "ILIKE",
                        _ => "LIKE",
                    };
                    out.push(&format!("{col} {op} "));
                    out.push_value(&Value::Text(format!("%{}%", escape_like(text))));
                    out.push(" ESCAPE '\\'");
                }
            }
        }
        if field.is_empty() {
            separate(out, first);
            out.push("1 = 1");
        }
    }

    fn append_order(&self, order: &OrderBy, out: &mut SqlWriter) -> Result<(), DomainError> {
        if order.is_empty() {
            return Ok(());
        }
        let mut clauses = Vec::with_capacity(order.clauses().len());
        for clause in order.clauses() {
            if clause.is_nested() {
                return Err(DomainError::invalid_argument(format!(
                    "ordering by relation path `{}` is not supported by the SQL backend",
                    clause.path.join(".")
                )));
            }
            let col = self.ident(&clause.path[0])?;
            match clause.direction {
                SortOrder::Asc => clauses.push(format!("{col} ASC")),
                SortOrder::Desc => clauses.push(format!("{col} DESC")),
            }
        }
        out.push(" ORDER BY ");
        out.push(&clauses.join(", "));
        Ok(())
    }

    fn append_limit_offset(&self, take: Option<u64>, skip: Option<u64>, out: &mut SqlWriter) {
        // Both engines read LIMIT and OFFSET as signed 64-bit integers.
        let take = take.map(|n| n.min(MAX_ROWS));
        let skip = skip.map(|n| n.min(MAX_ROWS));
        match (take, skip, self.dialect) {
            (Some(limit), _, _) => out.push(&format!(" LIMIT {limit}")),
            // SQLite only accepts OFFSET after a LIMIT
            (None, Some(_), Dialect::Sqlite) => out.push(" LIMIT -1"),
            (None, _, _) => {}
        }
        if let Some(offset) = skip {
            out.push(&format!(" OFFSET {offset}"));
        }
    }
}

const MAX_ROWS: u64 = i64::MAX as u64;

struct SqlWriter {
    sql: String,
    params: Vec<Value>,
    dialect: Dialect,
}

impl SqlWriter {
    fn new(dialect: Dialect) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            dialect,
        }
    }

    fn push(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    /// NULL is inlined so backends never have to bind an untyped null.
    fn push_value(&mut self, value: &Value) {
        if value.is_null() {
            self.sql.push_str("NULL");
            return;
        }
        self.params.push(value.clone());
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }
}

fn separate(out: &mut SqlWriter, first: &mut bool) {
    if !*first {
        out.push(" AND ");
    }
    *first = false;
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn format_identifier_checked(
    ident: &str,
    dialect: Dialect,
    allow_star: bool,
    kind: &'static str,
) -> Result<String, DomainError> {
    if !is_valid_identifier(ident, allow_star) {
        return Err(DomainError::invalid_argument(format!(
            "invalid {kind} identifier: {ident}"
        )));
    }
    Ok(quote_identifier(ident, dialect, allow_star))
}

fn is_valid_identifier(ident: &str, allow_star: bool) -> bool {
    if ident.is_empty() {
        return false;
    }
    let parts: Vec<&str> = ident.split('.').collect();
    for (idx, part) in parts.iter().enumerate() {
        if allow_star && *part == "*" {
            return idx + 1 == parts.len();
        }
        if !is_valid_segment(part) {
            return false;
        }
    }
    true
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote_identifier(ident: &str, dialect: Dialect, allow_star: bool) -> String {
    let quote = dialect.quote_char();
    let parts: Vec<&str> = ident.split('.').collect();
    let last_idx = parts.len().saturating_sub(1);
    parts
        .into_iter()
        .enumerate()
        .map(|(idx, part)| {
            if allow_star && part == "*" && idx == last_idx {
                part.to_string()
            } else {
                format!("{quote}{part}{quote}")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::query::where_input::date_time_range_input;
    use chrono::{TimeZone, Utc};

    fn posts(dialect: Dialect) -> QueryBuilder {
        QueryBuilder::new("posts", dialect).columns(&["id", "title"])
    }

    #[test]
    fn simple_select() {
        let stmt = QueryBuilder::new("posts", Dialect::Sqlite)
            .select(&FindManyArgs::new())
            .unwrap();
        assert_eq!(stmt.sql, r#"SELECT * FROM "posts""#);
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn select_with_filter_order_and_window() {
        let args = FindManyArgs::new()
            .filter(WhereInput::new().eq("status", "active"))
            .order_by(OrderBy::parse("id:desc").unwrap())
            .skip(20)
            .take(10);
        let stmt = posts(Dialect::Postgres).select(&args).unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT "id", "title" FROM "posts" WHERE "status" = $1 ORDER BY "id" DESC LIMIT 10 OFFSET 20"#
        );
        assert_eq!(stmt.params, vec![Value::from("active")]);
    }

    #[test]
    fn sqlite_offset_without_limit() {
        let stmt = posts(Dialect::Sqlite)
            .select(&FindManyArgs::new().skip(5))
            .unwrap();
        assert!(stmt.sql.ends_with(" LIMIT -1 OFFSET 5"));
    }

    #[test]
    fn huge_window_is_clamped_to_signed_range() {
        let args = FindManyArgs::new().skip(u64::MAX).take(u64::MAX);
        let stmt = posts(Dialect::Postgres).select(&args).unwrap();
        assert!(stmt
            .sql
            .ends_with(" LIMIT 9223372036854775807 OFFSET 9223372036854775807"));

        let stmt = posts(Dialect::Sqlite)
            .select(&FindManyArgs::new().skip(u64::MAX))
            .unwrap();
        assert!(stmt.sql.ends_with(" LIMIT -1 OFFSET 9223372036854775807"));
    }

    #[test]
    fn count_query() {
        let filter = WhereInput::new().field("deletedAt", FieldFilter::is_null());
        let stmt = posts(Dialect::Sqlite).count(Some(&filter)).unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT COUNT(*) FROM "posts" WHERE "deletedAt" IS NULL"#
        );
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn span_predicate_renders_or_of_overlap_cases() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();
        let filter = date_time_range_input("startsAt", "endsAt", Some(start), Some(end)).unwrap();
        let stmt = posts(Dialect::Postgres).count(Some(&filter)).unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT COUNT(*) FROM "posts" WHERE (("startsAt" <= $1 AND "endsAt" >= $2) OR ("startsAt" <= $3 AND "endsAt" IS NULL))"#
        );
        assert_eq!(
            stmt.params,
            vec![Value::from(end), Value::from(start), Value::from(end)]
        );
    }

    #[test]
    fn contains_escapes_wildcards() {
        let filter = WhereInput::new().field(
            "title",
            FieldFilter::contains("50%_off", MatchMode::Insensitive),
        );
        let stmt = posts(Dialect::Postgres).count(Some(&filter)).unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT COUNT(*) FROM "posts" WHERE "title" ILIKE $1 ESCAPE '\'"#
        );
        assert_eq!(stmt.params, vec![Value::from(r"%50\%\_off%")]);
    }

    #[test]
    fn sqlite_case_sensitive_contains_uses_instr() {
        let filter = WhereInput::new().field("title", FieldFilter::contains("Rust", MatchMode::Default));
        let stmt = posts(Dialect::Sqlite).count(Some(&filter)).unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT COUNT(*) FROM "posts" WHERE instr("title", ?) > 0"#
        );
    }

    #[test]
    fn empty_or_matches_nothing_and_empty_in_too() {
        let filter = WhereInput::any(vec![]).field("id", FieldFilter::one_of(Vec::<i64>::new()));
        let stmt = posts(Dialect::Sqlite).count(Some(&filter)).unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT COUNT(*) FROM "posts" WHERE 1 = 0 AND (1 = 0)"#
        );
    }

    #[test]
    fn update_one_targets_a_single_row() {
        let args = WriteArgs::new(
            WhereInput::new().eq("slug", "hello"),
            Data::new().set("deletedAt", 1),
        );
        let stmt = posts(Dialect::Postgres).update_one(&args).unwrap();
        assert_eq!(
            stmt.sql,
            r#"UPDATE "posts" SET "deletedAt" = $1 WHERE "id" = (SELECT "id" FROM "posts" WHERE "slug" = $2 LIMIT 1) RETURNING "id", "title""#
        );
        assert_eq!(stmt.params, vec![Value::from(1), Value::from("hello")]);
    }

    #[test]
    fn update_without_filter_is_rejected() {
        let args = WriteArgs::new(WhereInput::new(), Data::new().set("a", 1));
        let err = posts(Dialect::Sqlite).update_one(&args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn insert_inlines_null() {
        let args = CreateArgs::new(Data::new().set("title", "t").set("endsAt", Value::Null));
        let stmt = posts(Dialect::Sqlite).insert(&args).unwrap();
        assert_eq!(
            stmt.sql,
            r#"INSERT INTO "posts" ("title", "endsAt") VALUES (?, NULL) RETURNING "id", "title""#
        );
        assert_eq!(stmt.params, vec![Value::from("t")]);
    }

    #[test]
    fn nested_order_is_rejected() {
        let args = FindManyArgs::new().order_by(OrderBy::parse("user.email").unwrap());
        let err = posts(Dialect::Sqlite).select(&args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn invalid_identifier_is_rejected() {
        let err = QueryBuilder::new("posts;drop", Dialect::Sqlite)
            .select(&FindManyArgs::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let filter = WhereInput::new().eq("a b", 1);
        assert!(posts(Dialect::Sqlite).count(Some(&filter)).is_err());
    }

    #[test]
    fn qualified_identifiers_are_quoted_per_segment() {
        let stmt = QueryBuilder::new("blog.posts", Dialect::Postgres)
            .select(&FindManyArgs::new().select(&["posts.*"]))
            .unwrap();
        assert_eq!(stmt.sql, r#"SELECT "posts".* FROM "blog"."posts""#);
    }
}
