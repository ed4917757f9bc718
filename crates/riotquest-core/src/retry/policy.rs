/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-enqueue the request for a later wave.
    Retry,
    /// The failure is terminal.
    NoRetry,
}

/// Capped retry policy. One budget is shared by every transient kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub retry_limit: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_limit: crate::dispatcher::DEFAULT_RETRY_LIMIT,
        }
    }
}

impl RetryPolicy {
    pub fn new(retry_limit: u32) -> Self {
        Self { retry_limit }
    }

    /// Decide whether a failed attempt gets another try.
    ///
    /// `retries_spent` is the number of retries already made for this request
    /// (0 after the first attempt fails).
    pub fn decide(&self, retries_spent: u32, kind: super::FailureKind) -> RetryDecision {
        if retries_spent >= self.retry_limit {
            return RetryDecision::NoRetry;
        }
        if kind.is_transient() {
            RetryDecision::Retry
        } else {
            RetryDecision::NoRetry
        }
    }

    pub fn should_retry(&self, retries_spent: u32, failure: &super::FailureInfo) -> bool {
        self.decide(retries_spent, failure.kind) == RetryDecision::Retry
    }
}
