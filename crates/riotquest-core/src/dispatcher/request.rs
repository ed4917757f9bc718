//! Per-request state: descriptor, callbacks, attempt count and lifecycle.
//!
//! ```text
//! Pending -> InFlight -> Succeeded
//!               |------> Pending   (retry)
//!               `------> Failed
//! ```

use std::fmt;

use crate::request::{DescriptorError, MappingError, RawResponse, RequestDescriptor, WireRequest};
use crate::retry::{FailureInfo, RetryPolicy};

/// Terminal-failure callback.
pub type FailCallback = Box<dyn FnOnce(FailureInfo)>;

/// Lifecycle of an `AsyncRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Succeeded | RequestState::Failed)
    }
}

/// A transition was requested from a state that does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid request transition: {event} while {from:?}")]
pub struct InvalidTransition {
    pub from: RequestState,
    pub event: &'static str,
}

/// Result of one transfer, as seen by the state machine.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// A response arrived (any status).
    Response(RawResponse),
    /// No usable response; already classified.
    Transport(FailureInfo),
}

/// What `settle` did with an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// `on_done` ran.
    Succeeded,
    /// Back to `Pending` for a later wave.
    Retrying(FailureInfo),
    /// `on_fail` ran.
    Failed,
    /// Terminal failure with no `on_fail`; the caller must escalate it.
    Unhandled(FailureInfo),
}

/// Two headers stamped onto every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardHeaders {
    pub api_key: String,
    pub user_agent: String,
}

impl StandardHeaders {
    pub const API_KEY_HEADER: &'static str = "X-Riot-Token";

    pub fn apply(&self, request: &WireRequest) -> WireRequest {
        request
            .with_header(Self::API_KEY_HEADER, &self.api_key)
            .with_header("User-Agent", &self.user_agent)
    }
}

/// Descriptor + success callback with the output type erased, so requests
/// with different outputs can share one queue.
trait Target {
    /// Map `raw` and hand the value to `on_done`. On mapping failure
    /// `on_done` is kept unused.
    fn deliver(&mut self, raw: &RawResponse) -> Result<(), MappingError>;
}

struct Typed<D: RequestDescriptor> {
    descriptor: D,
    on_done: Option<Box<dyn FnOnce(D::Output)>>,
}

impl<D: RequestDescriptor> Target for Typed<D> {
    fn deliver(&mut self, raw: &RawResponse) -> Result<(), MappingError> {
        let value = self.descriptor.map_response(raw)?;
        if let Some(on_done) = self.on_done.take() {
            on_done(value);
        }
        Ok(())
    }
}

/// One queued request and everything needed to drive it to a terminal state.
pub struct AsyncRequest {
    target: Box<dyn Target>,
    template: WireRequest,
    on_fail: Option<FailCallback>,
    attempt_count: u32,
    state: RequestState,
}

impl AsyncRequest {
    /// Build the wire request now so malformed descriptors fail at `add` time.
    pub fn new<D, F>(
        descriptor: D,
        on_done: F,
        on_fail: Option<FailCallback>,
    ) -> Result<Self, DescriptorError>
    where
        D: RequestDescriptor + 'static,
        D::Output: 'static,
        F: FnOnce(D::Output) + 'static,
    {
        let template = descriptor.build_wire_request()?;
        Ok(Self {
            target: Box::new(Typed {
                descriptor,
                on_done: Some(Box::new(on_done)),
            }),
            template,
            on_fail,
            attempt_count: 0,
            state: RequestState::Pending,
        })
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// The request as the descriptor built it, without standard headers.
    pub fn template(&self) -> &WireRequest {
        &self.template
    }

    /// `Pending -> InFlight`: count the attempt and return the stamped request to send.
    pub fn begin_attempt(
        &mut self,
        headers: &StandardHeaders,
    ) -> Result<WireRequest, InvalidTransition> {
        if self.state != RequestState::Pending {
            return Err(InvalidTransition {
                from: self.state,
                event: "begin_attempt",
            });
        }
        self.attempt_count += 1;
        self.state = RequestState::InFlight;
        Ok(headers.apply(&self.template))
    }

    /// Settle an in-flight attempt: succeed, schedule a retry, or fail.
    pub fn settle(
        &mut self,
        outcome: AttemptOutcome,
        policy: &RetryPolicy,
    ) -> Result<Settlement, InvalidTransition> {
        if self.state != RequestState::InFlight {
            return Err(InvalidTransition {
                from: self.state,
                event: "settle",
            });
        }

        let failure = match outcome {
            AttemptOutcome::Response(raw) if raw.is_success() => {
                match self.target.deliver(&raw) {
                    Ok(()) => {
                        self.state = RequestState::Succeeded;
                        self.on_fail = None;
                        return Ok(Settlement::Succeeded);
                    }
                    Err(e) => FailureInfo::from_mapping(raw.status, &e),
                }
            }
            AttemptOutcome::Response(raw) => FailureInfo::from_response(&raw),
            AttemptOutcome::Transport(failure) => failure,
        };

        let retries_spent = self.attempt_count.saturating_sub(1);
        if policy.should_retry(retries_spent, &failure) {
            self.state = RequestState::Pending;
            return Ok(Settlement::Retrying(failure));
        }

        self.state = RequestState::Failed;
        match self.on_fail.take() {
            Some(on_fail) => {
                on_fail(failure);
                Ok(Settlement::Failed)
            }
            None => Ok(Settlement::Unhandled(failure)),
        }
    }

    /// Force a non-terminal request to `Failed` without another attempt.
    /// Returns whether `on_fail` ran.
    pub fn abort(&mut self, failure: FailureInfo) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = RequestState::Failed;
        match self.on_fail.take() {
            Some(on_fail) => {
                on_fail(failure);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for AsyncRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncRequest")
            .field("request", &self.template)
            .field("attempt_count", &self.attempt_count)
            .field("state", &self.state)
            .field("has_on_fail", &self.on_fail.is_some())
            .finish()
    }
}
