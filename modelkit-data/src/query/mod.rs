//! Typed predicates, sort keys, and their SQL rendering.

pub mod filter;
pub mod order_by;
pub mod sql;
pub mod where_input;

pub use filter::{merge_where, FieldFilter, MatchMode, WhereInput, WhereTarget};
pub use order_by::{OrderBy, OrderByClause, SortOrder};
pub use sql::{Dialect, QueryBuilder, Statement};
pub use where_input::{date_time_range_input, keyword_input, parse_utc_bound, single_date_time_input};
