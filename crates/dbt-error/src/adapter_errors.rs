use arrow_schema::ArrowError;
use minijinja::{Error as MinijinjaError, ErrorKind as MinijinjaErrorKind};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::{fmt, panic};
use tokio::task::JoinError;

pub type AdapterResult<T> = Result<T, AdapterError>;

/// A pinned Future that produces an `AdapterResult<T>`.
pub type AsyncAdapterResult<'a, T> = Pin<Box<dyn Future<Output = AdapterResult<T>> + Send + 'a>>;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AdapterErrorKind {
    /// Internal error
    Internal,
    /// Configuration-related error
    Configuration,
    /// An integration with the same name is already registered
    AlreadyExists,
    /// Lookup of an unregistered name
    NotFound,
    /// Catalog type not supported by the backend
    NotSupported,
    /// Missing or malformed integration property
    InvalidIntegrationConfig,
    /// Model-supplied value failed validation while building a relation
    Resolution,
    /// A single metadata collection task failed
    AggregationTask,
    /// Predicate cannot be placed in any chunk
    Chunking,
    /// Driver error
    Driver,
    /// Arrow error
    Arrow,
    /// Cancelled operation
    Cancelled,
    /// Input/Output error
    Io,
    /// JSON ser/deserialization error
    SerdeJSON,
    /// YAML ser/deserialization error
    SerdeYAML,
}

/// Coarse grouping of error kinds by how callers are expected to react.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorCategory {
    /// Fatal, raised while loading or registering catalog configuration
    Configuration,
    /// Fatal to the resolution of a single model
    Resolution,
    /// Captured and reported alongside partial metadata
    AggregationTask,
    /// Fatal to a single chunking call
    Chunking,
    Other,
}

impl AdapterErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AdapterErrorKind::Configuration
            | AdapterErrorKind::AlreadyExists
            | AdapterErrorKind::NotFound
            | AdapterErrorKind::NotSupported
            | AdapterErrorKind::InvalidIntegrationConfig
            | AdapterErrorKind::SerdeYAML => ErrorCategory::Configuration,
            AdapterErrorKind::Resolution => ErrorCategory::Resolution,
            AdapterErrorKind::AggregationTask => ErrorCategory::AggregationTask,
            AdapterErrorKind::Chunking => ErrorCategory::Chunking,
            _ => ErrorCategory::Other,
        }
    }
}

impl fmt::Display for AdapterErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                AdapterErrorKind::Internal => "Internal Error",
                AdapterErrorKind::Configuration => "Configuration Error",
                AdapterErrorKind::AlreadyExists => "Already Exists",
                AdapterErrorKind::NotFound => "Not Found",
                AdapterErrorKind::NotSupported => "Not Supported",
                AdapterErrorKind::InvalidIntegrationConfig => "Invalid Integration Config",
                AdapterErrorKind::Resolution => "Resolution Error",
                AdapterErrorKind::AggregationTask => "Aggregation Task Error",
                AdapterErrorKind::Chunking => "Chunking Error",
                AdapterErrorKind::Driver => "Driver Error",
                AdapterErrorKind::Arrow => "Arrow Error",
                AdapterErrorKind::Cancelled => "Cancelled",
                AdapterErrorKind::Io => "IoError",
                AdapterErrorKind::SerdeJSON => "Serde JSON Error",
                AdapterErrorKind::SerdeYAML => "Serde YAML Error",
            }
        )
    }
}

/// Adapter error.
#[derive(Debug, Clone)]
pub struct AdapterError {
    kind: AdapterErrorKind,
    message: String,
    /// Source of this error
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl AdapterError {
    /// Create new error.
    pub fn new(kind: AdapterErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            source: None,
        }
    }

    /// Attaches another error as source to this error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Create an AdapterError from a configuration message
    pub fn from_config(msg: impl Into<String>) -> Self {
        AdapterError::new(AdapterErrorKind::Configuration, msg)
    }

    /// Wrap an error raised by one metadata collection task, prefixing the task label.
    pub fn aggregation_task(task: impl fmt::Display, err: AdapterError) -> Self {
        let message = format!("{task}: {err}");
        let mut wrapped = AdapterError::new(AdapterErrorKind::AggregationTask, message);
        wrapped.source = Some(Arc::new(err));
        wrapped
    }

    pub fn kind(&self) -> AdapterErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            match self.kind {
                // driver messages already carry a backend prefix
                AdapterErrorKind::Driver => write!(f, "{}", self.message),
                _ => write!(f, "{}: {}", self.kind, self.message),
            }
        }
    }
}

impl std::error::Error for AdapterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// Convert AdapterError to MinijinjaError so template callers can surface it
impl From<AdapterError> for MinijinjaError {
    fn from(err: AdapterError) -> Self {
        MinijinjaError::new(MinijinjaErrorKind::InvalidOperation, format!("{err}"))
            .with_source(err)
    }
}

impl From<MinijinjaError> for AdapterError {
    fn from(err: MinijinjaError) -> Self {
        AdapterError::new(AdapterErrorKind::Configuration, err.to_string()).with_source(err)
    }
}

impl From<io::Error> for AdapterError {
    fn from(err: io::Error) -> Self {
        AdapterError::new(AdapterErrorKind::Io, err.to_string())
    }
}

impl From<ArrowError> for AdapterError {
    fn from(err: ArrowError) -> Self {
        AdapterError::new(AdapterErrorKind::Arrow, err.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::new(AdapterErrorKind::SerdeJSON, err.to_string())
    }
}

impl From<serde_yaml::Error> for AdapterError {
    fn from(err: serde_yaml::Error) -> Self {
        AdapterError::new(AdapterErrorKind::SerdeYAML, err.to_string())
    }
}

impl From<JoinError> for AdapterError {
    fn from(err: JoinError) -> Self {
        if err.is_cancelled() {
            AdapterError::new(AdapterErrorKind::Cancelled, "")
        } else if err.is_panic() {
            panic::resume_unwind(err.into_panic());
        } else {
            AdapterError::new(AdapterErrorKind::Internal, err.to_string())
        }
    }
}
