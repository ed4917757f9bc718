//! Observer hook for retries and waves. The dispatcher only publishes.

use crate::request::WireRequest;

/// Receives dispatcher events. Used for logging and tests, never for correctness.
pub trait DispatchObserver: Send + Sync {
    /// A request is about to be sent again; `attempt` is the new attempt number (>= 2).
    fn request_retried(&self, attempt: u32, request: &WireRequest);

    /// A wave of `size` requests is about to be dispatched.
    fn wave_started(&self, _size: usize) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {
    fn request_retried(&self, _attempt: u32, _request: &WireRequest) {}
}

/// Observer that logs retries through `tracing`. Waves are already logged
/// by the dispatcher itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DispatchObserver for TracingObserver {
    fn request_retried(&self, attempt: u32, request: &WireRequest) {
        tracing::warn!(attempt, method = %request.method, url = %request.url, "retrying request");
    }
}
