/// Classification for retry policy.
///
/// Used by [`with_backoff`](crate::backoff::with_backoff) to decide whether a
/// failed GET should be attempted again.
///
/// | Class | Retried? |
/// |-------|----------|
/// | `Never` | No, the error is returned immediately |
/// | `WithBackoff` | Yes, after an exponentially growing delay |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad credentials, missing account, malformed payload.
    /// The request is fundamentally invalid and retrying won't help.
    Never,

    /// Retry with exponential backoff.
    ///
    /// Used for transient errors like rate limiting (429), gateway errors
    /// (5xx) or timeouts, where the same request may well succeed later.
    WithBackoff,
}
