pub mod accessor;
pub mod config;
pub mod entity;
pub mod error;
pub mod extensions;
pub mod logging;
pub mod page;
pub mod query;
pub mod registry;
pub mod value;

pub use accessor::{CreateArgs, FindManyArgs, ModelAccessor, UniqueArgs, WriteArgs};
pub use config::{ConfigError, DataConfig, DataSettings};
pub use entity::Entity;
pub use error::{
    translate, DataError, DomainError, ErrorKind, ResultExt, StorageCode, StorageError,
};
pub use extensions::{
    FindFirstOrCreateArgs, FindOrCreate, FindUniqueOrCreateArgs, SoftDeleteColumnType,
    SoftDeleteSpec,
};
pub use logging::{LogLevel, NoopQueryLogger, QueryLogger, TracingQueryLogger};
pub use page::{
    Page, PaginationMeta, PaginationQuery, PaginationRequest, ResourceList, DEFAULT_LIMIT,
};
pub use query::{
    merge_where, FieldFilter, MatchMode, OrderBy, OrderByClause, SortOrder, WhereInput,
    WhereTarget,
};
pub use registry::ModelExt;
pub use value::{Data, Value};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::query::{
        date_time_range_input, keyword_input, parse_utc_bound, single_date_time_input,
    };
    pub use crate::{
        merge_where, Data, DataError, DomainError, Entity, ErrorKind, FieldFilter,
        FindFirstOrCreateArgs, FindManyArgs, FindOrCreate, FindUniqueOrCreateArgs, MatchMode,
        ModelAccessor, ModelExt, OrderBy, Page, PaginationQuery, PaginationRequest, ResultExt,
        SoftDeleteColumnType, SoftDeleteSpec, SortOrder, UniqueArgs, Value, WhereInput,
        WhereTarget, WriteArgs,
    };
}
