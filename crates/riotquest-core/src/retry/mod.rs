//! Failure classification and retry decisions.
//!
//! Every failed attempt is labelled with a `FailureKind`; the `RetryPolicy`
//! looks only at that label and the attempt budget, so the dispatcher and
//! `Dispatcher::call` share one consistent policy.

mod classify;
mod failure;
mod policy;

pub use classify::{classify_curl_error, classify_http_status};
pub use failure::{FailureInfo, FailureKind};
pub use policy::{RetryDecision, RetryPolicy};
