//! Connection context and unit of work.
//!
//! [`Db`] owns the pool and the query logger; every accessor it hands out
//! shares both. [`UnitOfWork`] wraps one open transaction so that several
//! accessors (possibly for different entities) commit or roll back together.

use std::future::Future;
use std::sync::Arc;

use modelkit_data::config::ConfigError;
use modelkit_data::{DataError, DataSettings, Entity, NoopQueryLogger, QueryLogger, TracingQueryLogger};
use sqlx::pool::PoolOptions;
use sqlx::Pool;
use tokio::sync::Mutex;

use crate::error::{closed, SqlxErrorExt};
use crate::model::{Backend, Conn, SharedTx, SqlxModel};

/// Pool plus query logger, cheap to clone.
///
/// # Example
///
/// ```ignore
/// let db = Db::<Sqlite>::connect(&settings).await?;
/// let posts = db.model::<Post>();
/// let page = posts.paginate(&request).await?;
/// ```
pub struct Db<DB: Backend> {
    pool: Pool<DB>,
    logger: Arc<dyn QueryLogger>,
}

impl<DB: Backend> Clone for Db<DB> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            logger: Arc::clone(&self.logger),
        }
    }
}

impl<DB: Backend> Db<DB> {
    /// Wrap an existing pool. Queries are logged through `tracing` at debug level.
    pub fn new(pool: Pool<DB>) -> Self {
        Self {
            pool,
            logger: Arc::new(TracingQueryLogger::default()),
        }
    }

    /// Replace the query logger.
    pub fn with_logger(mut self, logger: Arc<dyn QueryLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn pool(&self) -> &Pool<DB> {
        &self.pool
    }

    /// Open a pool from `data.database.*` settings.
    pub async fn connect(settings: &DataSettings) -> Result<Self, DataError> {
        let url = settings.database_url.as_deref().ok_or_else(|| {
            DataError::database(ConfigError::NotFound("data.database.url".to_string()))
        })?;
        let pool = PoolOptions::<DB>::new()
            .max_connections(settings.max_connections)
            .connect(url)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;

        let logger: Arc<dyn QueryLogger> = if settings.query_log_enabled {
            Arc::new(TracingQueryLogger::new(settings.query_log_level))
        } else {
            Arc::new(NoopQueryLogger)
        };
        tracing::info!(
            max_connections = settings.max_connections,
            query_log = settings.query_log_enabled,
            "database pool opened"
        );
        Ok(Self { pool, logger })
    }

    /// Accessor for `T` that runs each call on its own pooled connection.
    pub fn model<T: Entity>(&self) -> SqlxModel<T, DB> {
        SqlxModel::new(Conn::Pool(self.pool.clone()), Arc::clone(&self.logger))
    }

    /// Begin a transaction.
    pub async fn begin(&self) -> Result<UnitOfWork<DB>, DataError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(UnitOfWork {
            tx: Arc::new(Mutex::new(Some(tx))),
            logger: Arc::clone(&self.logger),
        })
    }

    /// Run `f` inside a transaction.
    ///
    /// Commits when `f` returns `Ok` and the unit of work is still open,
    /// rolls back when it returns `Err`. The closure may finish the unit of
    /// work itself; that is not an error.
    pub async fn transaction<F, Fut, R>(&self, f: F) -> Result<R, DataError>
    where
        F: FnOnce(UnitOfWork<DB>) -> Fut,
        Fut: Future<Output = Result<R, DataError>>,
    {
        let uow = self.begin().await?;
        match f(uow.clone()).await {
            Ok(value) => {
                if uow.is_open().await {
                    uow.commit().await?;
                }
                Ok(value)
            }
            Err(err) => {
                if uow.is_open().await {
                    if let Err(rollback) = uow.rollback().await {
                        tracing::warn!(error = %rollback, "transaction rollback failed");
                    }
                }
                Err(err)
            }
        }
    }
}

/// An open transaction shared by every accessor created from it.
///
/// Clones refer to the same transaction. Once [`commit`](Self::commit) or
/// [`rollback`](Self::rollback) has run, every accessor call fails with
/// [`TransactionClosed`](crate::TransactionClosed). Dropping the last clone
/// of an unfinished unit of work rolls it back.
pub struct UnitOfWork<DB: Backend> {
    tx: SharedTx<DB>,
    logger: Arc<dyn QueryLogger>,
}

impl<DB: Backend> Clone for UnitOfWork<DB> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
            logger: Arc::clone(&self.logger),
        }
    }
}

impl<DB: Backend> UnitOfWork<DB> {
    /// Accessor for `T` bound to this transaction.
    pub fn model<T: Entity>(&self) -> SqlxModel<T, DB> {
        SqlxModel::new(Conn::Tx(Arc::clone(&self.tx)), Arc::clone(&self.logger))
    }

    pub async fn is_open(&self) -> bool {
        self.tx.lock().await.is_some()
    }

    pub async fn commit(&self) -> Result<(), DataError> {
        let tx = self.tx.lock().await.take().ok_or_else(closed)?;
        tx.commit().await.map_err(SqlxErrorExt::into_data_error)
    }

    pub async fn rollback(&self) -> Result<(), DataError> {
        let tx = self.tx.lock().await.take().ok_or_else(closed)?;
        tx.rollback().await.map_err(SqlxErrorExt::into_data_error)
    }
}
