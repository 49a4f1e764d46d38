use std::future::Future;
use std::pin::Pin;

use modelkit_data::DataError;

use crate::model::Backend;
use crate::tx::{Db, UnitOfWork};

pub type SeedFuture<'a> = Pin<Box<dyn Future<Output = Result<(), DataError>> + Send + 'a>>;

/// Populates a database with fixture or reference data.
///
/// # Example
///
/// ```ignore
/// struct Tags;
///
/// impl Seeder<Sqlite> for Tags {
///     fn name(&self) -> &str { "tags" }
///
///     fn run<'a>(&'a self, uow: &'a UnitOfWork<Sqlite>) -> SeedFuture<'a> {
///         Box::pin(async move {
///             let tags = uow.model::<Tag>();
///             tags.create(&CreateArgs::new(Data::new().set("slug", "rust"))).await?;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Seeder<DB: Backend>: Send + Sync {
    fn name(&self) -> &str;

    fn run<'a>(&'a self, uow: &'a UnitOfWork<DB>) -> SeedFuture<'a>;
}

/// Run every seeder, in order, inside a single transaction.
///
/// Returns how many seeders ran. The first failure rolls back everything
/// written so far. An empty list does not open a transaction.
pub async fn run_seeders<DB: Backend>(
    db: &Db<DB>,
    seeders: &[Box<dyn Seeder<DB>>],
) -> Result<usize, DataError> {
    if seeders.is_empty() {
        tracing::info!("no seeders registered, nothing to do");
        return Ok(0);
    }

    db.transaction(|uow| async move {
        for seeder in seeders {
            tracing::info!(seeder = seeder.name(), "running seeder");
            if let Err(err) = seeder.run(&uow).await {
                tracing::error!(seeder = seeder.name(), error = %err, "seeder failed");
                return Err(err);
            }
        }
        Ok(seeders.len())
    })
    .await?;

    tracing::info!(count = seeders.len(), "seeding complete");
    Ok(seeders.len())
}
