use std::fmt;

use modelkit_data::{DataError, StorageCode, StorageError};
use sqlx::error::{DatabaseError, ErrorKind};

/// Extension trait for converting `sqlx::Error` into `DataError`.
///
/// Due to Rust's orphan rules, we can't implement `From<sqlx::Error> for DataError`
/// in this crate. Use `.map_err(SqlxErrorExt::into_data_error)` instead.
///
/// Errors the database classified (constraint violations, coded failures)
/// become [`DataError::Storage`]; everything else (I/O, pool timeouts,
/// decoding) becomes [`DataError::Database`] and is never translated.
pub trait SqlxErrorExt {
    fn into_data_error(self) -> DataError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_data_error(self) -> DataError {
        match self {
            sqlx::Error::RowNotFound => {
                StorageError::record_not_found("no rows returned by a query that expected one")
                    .with_source(sqlx::Error::RowNotFound)
                    .into()
            }
            sqlx::Error::Database(db) => classify(db),
            other => DataError::database(other),
        }
    }
}

/// Convenience alias for data-layer results using `DataError`.
pub type SqlxResult<T> = Result<T, DataError>;

fn classify(db: Box<dyn DatabaseError>) -> DataError {
    let native_code = db.code().map(|c| c.into_owned());
    let code = match (db.kind(), native_code) {
        (ErrorKind::UniqueViolation, _) => StorageCode::UniqueViolation,
        (ErrorKind::ForeignKeyViolation, _) => StorageCode::ForeignKeyViolation,
        (ErrorKind::NotNullViolation, _) => StorageCode::NotNullViolation,
        (ErrorKind::CheckViolation, _) => StorageCode::CheckViolation,
        (_, Some(native)) => StorageCode::Other(native),
        (_, None) => return DataError::database(sqlx::Error::Database(db)),
    };
    let target = if code == StorageCode::UniqueViolation {
        unique_target(db.as_ref())
    } else {
        Vec::new()
    };
    let message = db.message().to_string();
    StorageError::new(code, message)
        .with_target(target)
        .with_source(sqlx::Error::Database(db))
        .into()
}

fn unique_target(db: &(dyn DatabaseError + 'static)) -> Vec<String> {
    if let Some(columns) = postgres_target(db) {
        return columns;
    }
    if let Some(columns) = sqlite_unique_columns(db.message()) {
        return columns;
    }
    db.constraint().map(|c| vec![c.to_string()]).unwrap_or_default()
}

#[cfg(feature = "postgres")]
fn postgres_target(db: &(dyn DatabaseError + 'static)) -> Option<Vec<String>> {
    db.try_downcast_ref::<sqlx::postgres::PgDatabaseError>()?
        .detail()
        .and_then(postgres_key_columns)
}

#[cfg(not(feature = "postgres"))]
fn postgres_target(_db: &(dyn DatabaseError + 'static)) -> Option<Vec<String>> {
    None
}

/// `UNIQUE constraint failed: tags.slug, tags.owner` -> `["slug", "owner"]`.
fn sqlite_unique_columns(message: &str) -> Option<Vec<String>> {
    let list = message.strip_prefix("UNIQUE constraint failed: ")?;
    let columns: Vec<String> = list
        .split(',')
        .map(|qualified| {
            let qualified = qualified.trim();
            qualified
                .rsplit_once('.')
                .map_or(qualified, |(_, column)| column)
                .to_string()
        })
        .filter(|c| !c.is_empty())
        .collect();
    (!columns.is_empty()).then_some(columns)
}

/// `Key (slug, owner)=(rust, 1) already exists.` -> `["slug", "owner"]`.
#[cfg_attr(not(feature = "postgres"), allow(dead_code))]
fn postgres_key_columns(detail: &str) -> Option<Vec<String>> {
    let rest = detail.strip_prefix("Key (")?;
    let (list, _) = rest.split_once(")=(")?;
    let columns: Vec<String> = list
        .split(',')
        .map(|c| c.trim().trim_matches('"').to_string())
        .filter(|c| !c.is_empty())
        .collect();
    (!columns.is_empty()).then_some(columns)
}

/// Returned when a [`UnitOfWork`](crate::UnitOfWork) is used after it was
/// committed or rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionClosed;

impl fmt::Display for TransactionClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("transaction already committed or rolled back")
    }
}

impl std::error::Error for TransactionClosed {}

pub(crate) fn closed() -> DataError {
    DataError::database(TransactionClosed)
}
