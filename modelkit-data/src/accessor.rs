use std::future::Future;

use crate::error::DataError;
use crate::query::{OrderBy, WhereInput};
use crate::value::Data;

/// Arguments for `find_many` and `find_first`.
#[derive(Debug, Clone, Default)]
pub struct FindManyArgs {
    pub filter: Option<WhereInput>,
    pub order_by: OrderBy,
    pub skip: Option<u64>,
    pub take: Option<u64>,
    /// Column projection; `None` selects every column of the model.
    pub select: Option<Vec<String>>,
}

impl FindManyArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: WhereInput) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.select = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }
}

/// Arguments for lookups and writes addressed to a single row.
#[derive(Debug, Clone, Default)]
pub struct UniqueArgs {
    pub filter: WhereInput,
    pub select: Option<Vec<String>>,
}

impl UniqueArgs {
    pub fn new(filter: WhereInput) -> Self {
        Self {
            filter,
            select: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    pub data: Data,
    pub select: Option<Vec<String>>,
}

impl CreateArgs {
    pub fn new(data: Data) -> Self {
        Self { data, select: None }
    }
}

/// Arguments for `update` and `update_many`.
#[derive(Debug, Clone, Default)]
pub struct WriteArgs {
    pub filter: WhereInput,
    pub data: Data,
}

impl WriteArgs {
    pub fn new(filter: WhereInput, data: Data) -> Self {
        Self { filter, data }
    }
}

/// Primitive operations a storage client exposes for one model.
///
/// An accessor is bound to whatever handle created it (a pool or an open
/// transaction) and must not outlive it. Every extension in
/// [`crate::extensions`] is written against this trait only.
///
/// Uses RPITIT (return-position `impl Trait` in traits), no `async-trait` needed.
pub trait ModelAccessor: Send + Sync {
    type Row: Send + Sync + 'static;

    /// Label used when translating errors ("no such post").
    fn model_name(&self) -> &str;

    fn count(&self, filter: Option<&WhereInput>)
        -> impl Future<Output = Result<u64, DataError>> + Send;

    fn find_many(&self, args: &FindManyArgs)
        -> impl Future<Output = Result<Vec<Self::Row>, DataError>> + Send;

    /// First row under `args` (its `take` is ignored).
    fn find_first(&self, args: &FindManyArgs)
        -> impl Future<Output = Result<Option<Self::Row>, DataError>> + Send;

    fn find_unique(&self, args: &UniqueArgs)
        -> impl Future<Output = Result<Option<Self::Row>, DataError>> + Send;

    fn create(&self, args: &CreateArgs)
        -> impl Future<Output = Result<Self::Row, DataError>> + Send;

    /// Update one row. Fails with `StorageCode::RecordNotFound` when nothing matches.
    fn update(&self, args: &WriteArgs)
        -> impl Future<Output = Result<Self::Row, DataError>> + Send;

    /// Update every matching row, returning how many changed.
    fn update_many(&self, args: &WriteArgs)
        -> impl Future<Output = Result<u64, DataError>> + Send;

    /// Physically delete one row. Fails with `StorageCode::RecordNotFound` when nothing matches.
    fn delete(&self, args: &UniqueArgs)
        -> impl Future<Output = Result<Self::Row, DataError>> + Send;
}
