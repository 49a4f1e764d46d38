//! Read-then-write helpers.
//!
//! These are check-then-act, not atomic. Two concurrent callers can both miss
//! the read and both try to create. When the loser's create is rejected by a
//! unique constraint, the lookup is retried exactly once: a row found then is
//! returned with `was_created = false`, otherwise the unique violation is
//! returned as is (it translates to `Conflict`). Without a unique constraint
//! on the lookup columns both creates can succeed.
//!
//! The retry needs the connection to survive the rejected insert. Engines
//! that abort the whole transaction on a constraint error (PostgreSQL) need
//! the accessor to isolate `create`; the SQLx backend runs it under a
//! savepoint inside a unit of work.

use std::future::Future;

use crate::accessor::{CreateArgs, FindManyArgs, ModelAccessor, UniqueArgs};
use crate::error::DataError;
use crate::query::WhereInput;
use crate::value::Data;

#[derive(Debug, Clone, PartialEq)]
pub struct FindOrCreate<T> {
    pub value: T,
    pub was_created: bool,
}

impl<T> FindOrCreate<T> {
    pub fn found(value: T) -> Self {
        Self {
            value,
            was_created: false,
        }
    }

    pub fn created(value: T) -> Self {
        Self {
            value,
            was_created: true,
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindFirstOrCreateArgs {
    /// Lookup: filter, ordering and window of the `find_first` call.
    pub find: FindManyArgs,
    pub data: Data,
}

impl FindFirstOrCreateArgs {
    pub fn new(filter: WhereInput, data: Data) -> Self {
        Self {
            find: FindManyArgs::new().filter(filter),
            data,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindUniqueOrCreateArgs {
    pub filter: WhereInput,
    pub data: Data,
    pub select: Option<Vec<String>>,
}

impl FindUniqueOrCreateArgs {
    pub fn new(filter: WhereInput, data: Data) -> Self {
        Self {
            filter,
            data,
            select: None,
        }
    }
}

pub async fn find_first_or_create<M: ModelAccessor>(
    accessor: &M,
    args: &FindFirstOrCreateArgs,
) -> Result<FindOrCreate<M::Row>, DataError> {
    let create = CreateArgs {
        data: args.data.clone(),
        select: args.find.select.clone(),
    };
    let find = &args.find;
    read_or_create(accessor, move || accessor.find_first(find), &create).await
}

pub async fn find_unique_or_create<M: ModelAccessor>(
    accessor: &M,
    args: &FindUniqueOrCreateArgs,
) -> Result<FindOrCreate<M::Row>, DataError> {
    let lookup = UniqueArgs {
        filter: args.filter.clone(),
        select: args.select.clone(),
    };
    let create = CreateArgs {
        data: args.data.clone(),
        select: args.select.clone(),
    };
    let lookup = &lookup;
    read_or_create(accessor, move || accessor.find_unique(lookup), &create).await
}

async fn read_or_create<M, F, Fut>(
    accessor: &M,
    read: F,
    create: &CreateArgs,
) -> Result<FindOrCreate<M::Row>, DataError>
where
    M: ModelAccessor,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<M::Row>, DataError>>,
{
    if let Some(row) = read().await? {
        return Ok(FindOrCreate::found(row));
    }
    match accessor.create(create).await {
        Ok(row) => Ok(FindOrCreate::created(row)),
        Err(err) if err.is_unique_violation() => match read().await? {
            Some(row) => {
                tracing::debug!(
                    model = accessor.model_name(),
                    "find-or-create lost a concurrent insert, returning existing row"
                );
                Ok(FindOrCreate::found(row))
            }
            None => Err(err),
        },
        Err(err) => Err(err),
    }
}
