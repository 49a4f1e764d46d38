//! Generic primitives written against [`ModelAccessor`](crate::ModelAccessor) only.
//!
//! [`ModelExt`](crate::ModelExt) exposes all of them as methods.

mod exists;
mod find_or_create;
mod pagination;
mod soft_delete;

pub use exists::exists;
pub use find_or_create::{
    find_first_or_create, find_unique_or_create, FindFirstOrCreateArgs, FindOrCreate,
    FindUniqueOrCreateArgs,
};
pub use pagination::paginate;
pub use soft_delete::{
    soft_delete, soft_delete_many, SoftDeleteColumnType, SoftDeleteSpec, DEFAULT_COLUMN,
};
