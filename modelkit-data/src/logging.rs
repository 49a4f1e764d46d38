use std::fmt;
use std::str::FromStr;

use crate::value::Value;

/// Level query events are emitted at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level `{other}`")),
        }
    }
}

/// Log a message at the given level using `tracing`.
pub fn log_at_level(level: LogLevel, model: &str, sql: &str, params: &str) {
    match level {
        LogLevel::Trace => tracing::trace!(model, sql, params, "query"),
        LogLevel::Debug => tracing::debug!(model, sql, params, "query"),
        LogLevel::Info => tracing::info!(model, sql, params, "query"),
        LogLevel::Warn => tracing::warn!(model, sql, params, "query"),
        LogLevel::Error => tracing::error!(model, sql, params, "query"),
    }
}

/// Receives every statement a model accessor issues.
///
/// Injected into the connection context rather than installed globally, so
/// two contexts can log differently.
pub trait QueryLogger: Send + Sync {
    fn log_query(&self, model: &str, sql: &str, params: &[Value]);
}

/// Emits `model`, `sql` and `params` fields through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingQueryLogger {
    pub level: LogLevel,
}

impl TracingQueryLogger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }
}

impl QueryLogger for TracingQueryLogger {
    fn log_query(&self, model: &str, sql: &str, params: &[Value]) {
        log_at_level(self.level, model, sql, &Params(params).to_string());
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopQueryLogger;

impl QueryLogger for NoopQueryLogger {
    fn log_query(&self, _model: &str, _sql: &str, _params: &[Value]) {}
}

struct Params<'a>(&'a [Value]);

impl fmt::Display for Params<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<String>>);

    impl QueryLogger for Recording {
        fn log_query(&self, model: &str, sql: &str, params: &[Value]) {
            self.0
                .lock()
                .unwrap()
                .push(format!("{model}|{sql}|{}", Params(params)));
        }
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::default(), LogLevel::Debug);
    }

    #[test]
    fn test_params_formatting() {
        let params = [Value::from("a"), Value::Int(3), Value::Bool(true)];
        assert_eq!(Params(&params).to_string(), r#"["a", 3, true]"#);
        assert_eq!(Params(&[]).to_string(), "[]");
    }

    #[test]
    fn test_logger_trait_object() {
        let recording = Recording::default();
        let logger: &dyn QueryLogger = &recording;
        logger.log_query("post", "SELECT 1", &[Value::Int(1)]);
        assert_eq!(recording.0.lock().unwrap().as_slice(), ["post|SELECT 1|[1]"]);
    }

    #[test]
    fn test_builtin_loggers_do_not_panic() {
        TracingQueryLogger::new(LogLevel::Trace).log_query("post", "SELECT 1", &[]);
        NoopQueryLogger.log_query("post", "SELECT 1", &[Value::Null]);
    }
}
