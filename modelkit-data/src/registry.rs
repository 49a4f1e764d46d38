use std::future::Future;

use crate::accessor::ModelAccessor;
use crate::error::DataError;
use crate::extensions::{
    self, FindFirstOrCreateArgs, FindOrCreate, FindUniqueOrCreateArgs, SoftDeleteSpec,
};
use crate::page::{Page, PaginationRequest};
use crate::query::WhereInput;

/// The extension primitives as methods on every model accessor.
///
/// Blanket-implemented for all [`ModelAccessor`]s, so a backend gets the whole
/// set by implementing the accessor trait alone.
///
/// ```ignore
/// use modelkit_data::prelude::*;
///
/// let posts = db.model::<Post>();
/// let page = posts.paginate(&query.into_request(None)?).await?;
/// let found = posts
///     .find_unique_or_create(&FindUniqueOrCreateArgs::new(
///         WhereInput::new().eq("slug", "hello"),
///         Data::new().set("slug", "hello").set("title", "Hello"),
///     ))
///     .await?;
/// ```
pub trait ModelExt: ModelAccessor {
    fn paginate(
        &self,
        request: &PaginationRequest,
    ) -> impl Future<Output = Result<Page<Self::Row>, DataError>> + Send
    where
        Self: Sized,
    {
        extensions::paginate(self, request)
    }

    fn soft_delete(
        &self,
        filter: WhereInput,
        spec: &SoftDeleteSpec,
    ) -> impl Future<Output = Result<Self::Row, DataError>> + Send
    where
        Self: Sized,
    {
        extensions::soft_delete(self, filter, spec)
    }

    fn soft_delete_many(
        &self,
        filter: WhereInput,
        spec: &SoftDeleteSpec,
    ) -> impl Future<Output = Result<u64, DataError>> + Send
    where
        Self: Sized,
    {
        extensions::soft_delete_many(self, filter, spec)
    }

    fn find_first_or_create(
        &self,
        args: &FindFirstOrCreateArgs,
    ) -> impl Future<Output = Result<FindOrCreate<Self::Row>, DataError>> + Send
    where
        Self: Sized,
    {
        extensions::find_first_or_create(self, args)
    }

    fn find_unique_or_create(
        &self,
        args: &FindUniqueOrCreateArgs,
    ) -> impl Future<Output = Result<FindOrCreate<Self::Row>, DataError>> + Send
    where
        Self: Sized,
    {
        extensions::find_unique_or_create(self, args)
    }

    fn exists(
        &self,
        filter: Option<&WhereInput>,
    ) -> impl Future<Output = Result<bool, DataError>> + Send
    where
        Self: Sized,
    {
        extensions::exists(self, filter)
    }
}

impl<M: ModelAccessor> ModelExt for M {}
