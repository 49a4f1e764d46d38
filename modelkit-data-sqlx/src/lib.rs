//! # modelkit-data-sqlx — SQLx backend for the modelkit data layer
//!
//! This crate provides the [SQLx](https://github.com/launchbadge/sqlx)-specific
//! implementation of [`ModelAccessor`](modelkit_data::ModelAccessor). It
//! renders statements with [`modelkit_data::query::QueryBuilder`], binds
//! [`Value`](modelkit_data::Value)s, decodes rows through `sqlx::FromRow` and
//! classifies driver errors so the extension primitives (pagination, soft
//! delete, find-or-create) and the error translator work unchanged.
//!
//! # What's in this crate
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Db`] | Pool plus query logger; hands out pool-bound accessors |
//! | [`UnitOfWork`] | One open transaction shared by several accessors |
//! | [`SqlxModel`] | `ModelAccessor` for an entity `T` |
//! | [`Seeder`] / [`run_seeders`] | Transactional seed runner |
//! | [`SqlxErrorExt`] | Extension trait to convert `sqlx::Error` → `DataError` (`.into_data_error()`) |
//! | [`SqlxResult<T>`] | Type alias for `Result<T, DataError>` |
//!
//! # Feature flags
//!
//! | Feature    | Driver |
//! |------------|--------|
//! | `sqlite`   | SQLite via `sqlx/sqlite` (default) |
//! | `postgres` | PostgreSQL via `sqlx/postgres` |
//!
//! # Quick start
//!
//! ```ignore
//! use modelkit_data_sqlx::prelude::*;
//! use sqlx::Sqlite;
//!
//! #[derive(sqlx::FromRow)]
//! struct Tag { id: i64, slug: String }
//!
//! impl Entity for Tag {
//!     fn model_name() -> &'static str { "tag" }
//!     fn table_name() -> &'static str { "tags" }
//!     fn id_column() -> &'static str { "id" }
//!     fn columns() -> &'static [&'static str] { &["id", "slug"] }
//! }
//!
//! let db = Db::<Sqlite>::new(pool);
//! let tag = db
//!     .model::<Tag>()
//!     .find_unique_or_create(&FindUniqueOrCreateArgs::new(
//!         WhereInput::new().eq("slug", "rust"),
//!         Data::new().set("slug", "rust"),
//!     ))
//!     .await?;
//! ```
//!
//! # Transactions
//!
//! ```ignore
//! db.transaction(|uow| async move {
//!     let post = uow.model::<Post>().create(&CreateArgs::new(data)).await?;
//!     uow.model::<Tag>().update_many(&tag_update).await?;
//!     Ok(post)
//! })
//! .await?;
//! ```
//!
//! Commits on `Ok`, rolls back on `Err`. Dropping an unfinished
//! [`UnitOfWork`] also rolls back.
//!
//! # Error bridging
//!
//! Due to Rust's orphan rules, `From<sqlx::Error> for DataError` can't be
//! implemented here. Use the [`SqlxErrorExt`] trait instead:
//!
//! ```ignore
//! use modelkit_data_sqlx::SqlxErrorExt;
//!
//! let n: i64 = sqlx::query_scalar("SELECT count(*) FROM tags")
//!     .fetch_one(db.pool())
//!     .await
//!     .map_err(|e| e.into_data_error())?;
//! ```

pub mod error;
pub mod model;
pub mod seed;
pub mod tx;

pub use error::{SqlxErrorExt, SqlxResult, TransactionClosed};
pub use model::{Backend, SqlxModel};
pub use seed::{run_seeders, SeedFuture, Seeder};
pub use tx::{Db, UnitOfWork};

/// Re-exports of the most commonly used types from both `modelkit-data` and this crate.
pub mod prelude {
    pub use crate::{run_seeders, Db, SeedFuture, Seeder, SqlxErrorExt, SqlxModel, UnitOfWork};
    pub use modelkit_data::prelude::*;
    pub use modelkit_data::CreateArgs;
}
