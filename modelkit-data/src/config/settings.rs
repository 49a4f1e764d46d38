use std::num::NonZeroU64;

use super::{ConfigError, DataConfig};
use crate::extensions::SoftDeleteSpec;
use crate::logging::LogLevel;
use crate::page::DEFAULT_LIMIT;


/// Typed view over the `data.*` keys.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Page size for [`PaginationQuery::into_request_with`](crate::PaginationQuery::into_request_with)
    /// when the caller sends none.
    pub default_limit: NonZeroU64,
    pub soft_delete: SoftDeleteSpec,
    pub query_log_enabled: bool,
    pub query_log_level: LogLevel,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            default_limit: DEFAULT_LIMIT,
            soft_delete: SoftDeleteSpec::default(),
            query_log_enabled: true,
            query_log_level: LogLevel::Debug,
        }
    }
}

impl DataSettings {
    pub fn from_config(config: &DataConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let limit_key = "data.pagination.limit";
        let limit: u64 = config.get_or(limit_key, defaults.default_limit.get())?;
        let default_limit = NonZeroU64::new(limit).ok_or_else(|| ConfigError::Invalid {
            key: limit_key.to_string(),
            message: "must be a positive integer".to_string(),
        })?;

        let column: String =
            config.get_or("data.softdelete.column", defaults.soft_delete.column_name.clone())?;
        let type_key = "data.softdelete.type";
        let column_type: String = config.get_or(type_key, "date".to_string())?;
        let soft_delete =
            SoftDeleteSpec::from_parts(&column, &column_type).map_err(|e| ConfigError::Invalid {
                key: type_key.to_string(),
                message: e.message().to_string(),
            })?;

        let level_key = "data.querylog.level";
        let level: String = config.get_or(level_key, "debug".to_string())?;
        let query_log_level = level
            .parse::<LogLevel>()
            .map_err(|message| ConfigError::Invalid {
                key: level_key.to_string(),
                message,
            })?;

        Ok(Self {
            database_url: config.get_or("data.database.url", None)?,
            max_connections: config.get_or("data.database.connections", defaults.max_connections)?,
            default_limit,
            soft_delete,
            query_log_enabled: config.get_or("data.querylog.enabled", true)?,
            query_log_level,
        })
    }
}
