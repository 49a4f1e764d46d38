use crate::accessor::{FindManyArgs, ModelAccessor};
use crate::error::DataError;
use crate::page::{Page, PaginationRequest};

/// Count the matching rows, then fetch the requested slice.
///
/// `page = 0` fetches every matching row. Errors from either call propagate
/// unchanged and nothing is retried.
pub async fn paginate<M: ModelAccessor>(
    accessor: &M,
    request: &PaginationRequest,
) -> Result<Page<M::Row>, DataError> {
    let total_count = accessor.count(request.filter.as_ref()).await?;

    let mut args = FindManyArgs {
        filter: request.filter.clone(),
        order_by: request.order_by.clone(),
        ..FindManyArgs::default()
    };
    if let Some((skip, take)) = request.window() {
        args.skip = Some(skip);
        args.take = Some(take);
    }

    let result = accessor.find_many(&args).await?;
    Ok(Page::new(result, request, total_count))
}
