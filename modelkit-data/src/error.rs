use std::error::Error as StdError;
use std::fmt;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Classification a storage engine attaches to a failure it recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCode {
    /// The row targeted by a write does not exist.
    RecordNotFound,
    UniqueViolation,
    ForeignKeyViolation,
    NotNullViolation,
    CheckViolation,
    /// Any other engine-specific code (e.g. a SQLSTATE).
    Other(String),
}

impl StorageCode {
    pub fn as_str(&self) -> &str {
        match self {
            StorageCode::RecordNotFound => "record_not_found",
            StorageCode::UniqueViolation => "unique_violation",
            StorageCode::ForeignKeyViolation => "foreign_key_violation",
            StorageCode::NotNullViolation => "not_null_violation",
            StorageCode::CheckViolation => "check_violation",
            StorageCode::Other(code) => code,
        }
    }
}

impl fmt::Display for StorageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure the storage engine recognized and classified.
#[derive(Debug)]
pub struct StorageError {
    pub code: StorageCode,
    pub message: String,
    /// Columns involved in a constraint violation, when the engine reports them.
    pub target: Vec<String>,
    source: Option<BoxError>,
}

impl StorageError {
    pub fn new(code: StorageCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            target: Vec::new(),
            source: None,
        }
    }

    pub fn record_not_found(message: impl Into<String>) -> Self {
        Self::new(StorageCode::RecordNotFound, message)
    }

    pub fn unique_violation(target: Vec<String>, message: impl Into<String>) -> Self {
        Self::new(StorageCode::UniqueViolation, message).with_target(target)
    }

    pub fn with_target(mut self, target: Vec<String>) -> Self {
        self.target = target;
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl StdError for StorageError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Closed set of caller-facing error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidArgument,
    Internal,
}

impl ErrorKind {
    /// HTTP status a transport layer should answer with.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InvalidArgument => 400,
            ErrorKind::Internal => 500,
        }
    }
}

/// A classified, caller-facing error.
#[derive(Debug)]
pub struct DomainError {
    kind: ErrorKind,
    message: String,
    source: Option<BoxError>,
}

impl DomainError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::NotFound => write!(f, "Not found: {}", self.message),
            ErrorKind::Conflict => write!(f, "Conflict: {}", self.message),
            ErrorKind::InvalidArgument => write!(f, "Invalid argument: {}", self.message),
            ErrorKind::Internal => write!(f, "Internal error: {}", self.message),
        }
    }
}

impl StdError for DomainError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Errors returned by model accessors and the extension primitives.
#[derive(Debug)]
pub enum DataError {
    /// A failure the storage engine classified, not yet translated.
    Storage(StorageError),
    /// Anything the storage engine did not classify. Never translated.
    Database(BoxError),
    /// Caller input rejected before any storage call was issued.
    Domain(DomainError),
}

impl DataError {
    /// Construct a `Database` variant from any error type.
    ///
    /// Used by backend crates (e.g. `modelkit-data-sqlx`) to wrap
    /// driver-specific errors they cannot classify.
    pub fn database(err: impl StdError + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        DataError::Domain(DomainError::invalid_argument(message))
    }

    /// The storage code, when this is a classified storage failure.
    pub fn storage_code(&self) -> Option<&StorageCode> {
        match self {
            DataError::Storage(e) => Some(&e.code),
            _ => None,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.storage_code() == Some(&StorageCode::UniqueViolation)
    }

    /// Translate into the domain taxonomy, keeping `?` ergonomics.
    ///
    /// Classified failures come back as `DataError::Domain`; unclassified
    /// ones come back unchanged.
    pub fn translate(self, entity_label: &str) -> DataError {
        match translate(self, entity_label) {
            Ok(domain) => DataError::Domain(domain),
            Err(original) => original,
        }
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Storage(err) => write!(f, "Storage error: {err}"),
            DataError::Database(err) => write!(f, "Database error: {err}"),
            DataError::Domain(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for DataError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DataError::Storage(err) => Some(err),
            DataError::Database(err) => Some(err.as_ref()),
            DataError::Domain(err) => Some(err),
        }
    }
}

impl From<StorageError> for DataError {
    fn from(err: StorageError) -> Self {
        DataError::Storage(err)
    }
}

impl From<DomainError> for DataError {
    fn from(err: DomainError) -> Self {
        DataError::Domain(err)
    }
}

/// Map a storage failure onto the domain taxonomy.
///
/// Returns `Err(original)` for errors the storage engine did not classify, so
/// the caller can never mistake an unknown failure for a classified one.
pub fn translate(err: DataError, entity_label: &str) -> Result<DomainError, DataError> {
    match err {
        DataError::Storage(storage) => Ok(translate_storage(storage, entity_label)),
        DataError::Domain(domain) => Ok(domain),
        other => Err(other),
    }
}

fn translate_storage(err: StorageError, entity_label: &str) -> DomainError {
    match err.code {
        StorageCode::RecordNotFound => {
            DomainError::not_found(format!("no such {entity_label}")).with_source(err)
        }
        StorageCode::UniqueViolation => {
            let columns = err.target.join(", ");
            DomainError::conflict(format!("{entity_label} data conflict on {columns}"))
                .with_source(err)
        }
        _ => {
            tracing::error!(
                entity = entity_label,
                code = %err.code,
                message = %err.message,
                "unexpected storage error"
            );
            let message = format!(
                "{entity_label} storage error: {}({})",
                err.code, err.message
            );
            DomainError::internal(message).with_source(err)
        }
    }
}

/// `translate` for results, e.g. `model.create(&args).await.translate_err("post")?`.
pub trait ResultExt<T> {
    fn translate_err(self, entity_label: &str) -> Result<T, DataError>;
}

impl<T> ResultExt<T> for Result<T, DataError> {
    fn translate_err(self, entity_label: &str) -> Result<T, DataError> {
        self.map_err(|e| e.translate(entity_label))
    }
}
