mod adapter_errors;

pub use adapter_errors::{
    AdapterError, AdapterErrorKind, AdapterResult, AsyncAdapterResult, ErrorCategory,
};
