use thiserror::Error;

/// Errors raised while configuring the bus.
///
/// Publishing never fails; handler failures go to a
/// [`DiagnosticSink`](crate::DiagnosticSink) instead.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("invalid topic pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
