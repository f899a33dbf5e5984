//! Error types for dispatch and queue processing

/// Outcome of a single listener invocation.
///
/// Listeners report failure by returning an error; the dispatch machinery
/// stops the iteration in progress and surfaces the error to whoever called
/// `invoke`, `process` or `dispatch`. Nothing is retried.
pub type CallbackResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A listener returned an error during dispatch. The remaining listeners
    /// for that invocation are not called.
    #[error("listener failed during dispatch: {source}")]
    ListenerFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The policy hook extracting an event key from an argument payload
    /// failed. Treated the same as a listener failure.
    #[error("event key extraction failed: {source}")]
    ExtractFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;
