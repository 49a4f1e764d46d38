use crate::accessor::ModelAccessor;
use crate::error::DataError;
use crate::query::WhereInput;

/// Whether any row matches `filter`.
pub async fn exists<M: ModelAccessor>(
    accessor: &M,
    filter: Option<&WhereInput>,
) -> Result<bool, DataError> {
    Ok(accessor.count(filter).await? > 0)
}
