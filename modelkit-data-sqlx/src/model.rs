use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use modelkit_data::query::{Dialect, QueryBuilder, Statement, WhereInput};
use modelkit_data::{
    CreateArgs, DataError, Entity, FindManyArgs, ModelAccessor, QueryLogger, StorageError,
    UniqueArgs, Value, WriteArgs,
};
use sqlx::{Arguments, Database, Pool, Transaction};
use tokio::sync::Mutex;

use crate::error::{closed, SqlxErrorExt};

/// A database the statement builder can render for.
pub trait Backend: Database {
    const DIALECT: Dialect;
}

#[cfg(feature = "sqlite")]
impl Backend for sqlx::Sqlite {
    const DIALECT: Dialect = Dialect::Sqlite;
}

#[cfg(feature = "postgres")]
impl Backend for sqlx::Postgres {
    const DIALECT: Dialect = Dialect::Postgres;
}

/// A transaction shared by every accessor of one unit of work. `None` once
/// it has been committed or rolled back.
pub(crate) type SharedTx<DB> = Arc<Mutex<Option<Transaction<'static, DB>>>>;

pub(crate) enum Conn<DB: Database> {
    Pool(Pool<DB>),
    Tx(SharedTx<DB>),
}

impl<DB: Database> Clone for Conn<DB> {
    fn clone(&self) -> Self {
        match self {
            Conn::Pool(pool) => Conn::Pool(pool.clone()),
            Conn::Tx(tx) => Conn::Tx(Arc::clone(tx)),
        }
    }
}

/// [`ModelAccessor`] for entity `T`, backed by SQLx.
///
/// Obtained from [`Db::model`](crate::Db::model) (runs on the pool) or
/// [`UnitOfWork::model`](crate::UnitOfWork::model) (runs inside the
/// transaction). Rows decode through `T: sqlx::FromRow`, so a `select`
/// projection must still cover every field `T` reads.
///
/// # Example
///
/// ```ignore
/// let posts = db.model::<Post>();
/// let page = posts.paginate(&request).await?;
/// ```
pub struct SqlxModel<T, DB: Database> {
    conn: Conn<DB>,
    logger: Arc<dyn QueryLogger>,
    query: QueryBuilder,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity, DB: Backend> SqlxModel<T, DB> {
    pub(crate) fn new(conn: Conn<DB>, logger: Arc<dyn QueryLogger>) -> Self {
        Self {
            conn,
            logger,
            query: QueryBuilder::for_entity::<T>(DB::DIALECT),
            _marker: PhantomData,
        }
    }
}

impl<T, DB: Database> SqlxModel<T, DB> {
    /// The statement builder this accessor renders with.
    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    /// Whether this accessor runs inside a unit of work.
    pub fn in_transaction(&self) -> bool {
        matches!(self.conn, Conn::Tx(_))
    }
}

impl<T, DB: Database> Clone for SqlxModel<T, DB> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            logger: Arc::clone(&self.logger),
            query: self.query.clone(),
            _marker: PhantomData,
        }
    }
}

fn record_not_found(action: &str) -> DataError {
    StorageError::record_not_found(format!("Record to {action} not found.")).into()
}

macro_rules! impl_sqlx_model {
    ($db:ty, $row:ty) => {
        impl<T> SqlxModel<T, $db>
        where
            T: Entity + for<'r> sqlx::FromRow<'r, $row>,
        {
            fn arguments(params: &[Value]) -> Result<<$db as Database>::Arguments<'_>, DataError> {
                let mut args: <$db as Database>::Arguments<'_> = Default::default();
                for param in params {
                    let added = match param {
                        Value::Null => args.add(Option::<i64>::None),
                        Value::Bool(b) => args.add(*b),
                        Value::Int(i) => args.add(*i),
                        Value::Float(f) => args.add(*f),
                        Value::DateTime(dt) => args.add(*dt),
                        Value::Text(s) => args.add(s.as_str()),
                    };
                    added.map_err(DataError::Database)?;
                }
                Ok(args)
            }

            fn log(&self, stmt: &Statement) {
                self.logger
                    .log_query(T::model_name(), &stmt.sql, &stmt.params);
            }

            async fn fetch_all(&self, stmt: Statement) -> Result<Vec<T>, DataError> {
                self.log(&stmt);
                let args = Self::arguments(&stmt.params)?;
                let query = sqlx::query_as_with::<$db, T, _>(&stmt.sql, args);
                let rows = match &self.conn {
                    Conn::Pool(pool) => query.fetch_all(pool).await,
                    Conn::Tx(tx) => {
                        let mut guard = tx.lock().await;
                        let tx = guard.as_mut().ok_or_else(closed)?;
                        query.fetch_all(&mut **tx).await
                    }
                };
                rows.map_err(SqlxErrorExt::into_data_error)
            }

            async fn fetch_optional(&self, stmt: Statement) -> Result<Option<T>, DataError> {
                self.log(&stmt);
                let args = Self::arguments(&stmt.params)?;
                let query = sqlx::query_as_with::<$db, T, _>(&stmt.sql, args);
                let row = match &self.conn {
                    Conn::Pool(pool) => query.fetch_optional(pool).await,
                    Conn::Tx(tx) => {
                        let mut guard = tx.lock().await;
                        let tx = guard.as_mut().ok_or_else(closed)?;
                        query.fetch_optional(&mut **tx).await
                    }
                };
                row.map_err(SqlxErrorExt::into_data_error)
            }

            /// Inside a unit of work the insert runs under a savepoint, so a
            /// rejected row leaves the surrounding transaction usable.
            async fn insert_returning(&self, stmt: Statement) -> Result<Option<T>, DataError> {
                let Conn::Tx(tx) = &self.conn else {
                    return self.fetch_optional(stmt).await;
                };
                self.log(&stmt);
                let args = Self::arguments(&stmt.params)?;
                let mut guard = tx.lock().await;
                let tx = guard.as_mut().ok_or_else(closed)?;
                let mut savepoint = sqlx::Connection::begin(&mut **tx)
                    .await
                    .map_err(SqlxErrorExt::into_data_error)?;
                let row = sqlx::query_as_with::<$db, T, _>(&stmt.sql, args)
                    .fetch_optional(&mut *savepoint)
                    .await;
                match row {
                    Ok(row) => {
                        savepoint
                            .commit()
                            .await
                            .map_err(SqlxErrorExt::into_data_error)?;
                        Ok(row)
                    }
                    Err(err) => {
                        if let Err(rollback) = savepoint.rollback().await {
                            tracing::warn!(error = %rollback, "rollback to savepoint failed");
                        }
                        Err(err.into_data_error())
                    }
                }
            }

            async fn fetch_count(&self, stmt: Statement) -> Result<u64, DataError> {
                self.log(&stmt);
                let args = Self::arguments(&stmt.params)?;
                let query = sqlx::query_scalar_with::<$db, i64, _>(&stmt.sql, args);
                let count = match &self.conn {
                    Conn::Pool(pool) => query.fetch_one(pool).await,
                    Conn::Tx(tx) => {
                        let mut guard = tx.lock().await;
                        let tx = guard.as_mut().ok_or_else(closed)?;
                        query.fetch_one(&mut **tx).await
                    }
                };
                let count = count.map_err(SqlxErrorExt::into_data_error)?;
                Ok(u64::try_from(count).unwrap_or_default())
            }

            async fn execute(&self, stmt: Statement) -> Result<u64, DataError> {
                self.log(&stmt);
                let args = Self::arguments(&stmt.params)?;
                let query = sqlx::query_with::<$db, _>(&stmt.sql, args);
                let done = match &self.conn {
                    Conn::Pool(pool) => query.execute(pool).await,
                    Conn::Tx(tx) => {
                        let mut guard = tx.lock().await;
                        let tx = guard.as_mut().ok_or_else(closed)?;
                        query.execute(&mut **tx).await
                    }
                };
                Ok(done.map_err(SqlxErrorExt::into_data_error)?.rows_affected())
            }
        }

        impl<T> ModelAccessor for SqlxModel<T, $db>
        where
            T: Entity + for<'r> sqlx::FromRow<'r, $row>,
        {
            type Row = T;

            fn model_name(&self) -> &str {
                T::model_name()
            }

            fn count(
                &self,
                filter: Option<&WhereInput>,
            ) -> impl Future<Output = Result<u64, DataError>> + Send {
                async move {
                    let stmt = self.query.count(filter)?;
                    self.fetch_count(stmt).await
                }
            }

            fn find_many(
                &self,
                args: &FindManyArgs,
            ) -> impl Future<Output = Result<Vec<T>, DataError>> + Send {
                async move {
                    let stmt = self.query.select(args)?;
                    self.fetch_all(stmt).await
                }
            }

            fn find_first(
                &self,
                args: &FindManyArgs,
            ) -> impl Future<Output = Result<Option<T>, DataError>> + Send {
                async move {
                    let stmt = self.query.select_first(args)?;
                    self.fetch_optional(stmt).await
                }
            }

            fn find_unique(
                &self,
                args: &UniqueArgs,
            ) -> impl Future<Output = Result<Option<T>, DataError>> + Send {
                async move {
                    let stmt = self.query.select_unique(args)?;
                    self.fetch_optional(stmt).await
                }
            }

            fn create(&self, args: &CreateArgs) -> impl Future<Output = Result<T, DataError>> + Send {
                async move {
                    let stmt = self.query.insert(args)?;
                    self.insert_returning(stmt)
                        .await?
                        .ok_or_else(|| record_not_found("return after insert"))
                }
            }

            fn update(&self, args: &WriteArgs) -> impl Future<Output = Result<T, DataError>> + Send {
                async move {
                    let stmt = self.query.update_one(args)?;
                    self.fetch_optional(stmt)
                        .await?
                        .ok_or_else(|| record_not_found("update"))
                }
            }

            fn update_many(
                &self,
                args: &WriteArgs,
            ) -> impl Future<Output = Result<u64, DataError>> + Send {
                async move {
                    let stmt = self.query.update_many(args)?;
                    self.execute(stmt).await
                }
            }

            fn delete(&self, args: &UniqueArgs) -> impl Future<Output = Result<T, DataError>> + Send {
                async move {
                    let stmt = self.query.delete_one(args)?;
                    self.fetch_optional(stmt)
                        .await?
                        .ok_or_else(|| record_not_found("delete"))
                }
            }
        }
    };
}

#[cfg(feature = "sqlite")]
impl_sqlx_model!(sqlx::Sqlite, sqlx::sqlite::SqliteRow);

#[cfg(feature = "postgres")]
impl_sqlx_model!(sqlx::Postgres, sqlx::postgres::PgRow);
