//! Batch dispatcher: queue requests with `add`, run them with `exec`.
//!
//! Requests go out in waves of at most `concurrency` transfers over one curl
//! multi handle. Each wave settles completely before the next starts. All
//! completion handling (classification, retry decision, callbacks, queue
//! mutation) runs on the thread that called `exec`, one completion at a time,
//! so no request state is ever shared between threads.
//!
//! `clear` only drops bookkeeping. It is not cancellation: a transfer that is
//! already on the wire is not aborted.

mod error;
mod handler;
mod observer;
mod request;
mod wave;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

pub use error::DispatchError;
pub use observer::{DispatchObserver, NoopObserver, TracingObserver};
pub use request::{
    AsyncRequest, AttemptOutcome, FailCallback, InvalidTransition, RequestState, Settlement,
    StandardHeaders,
};

use crate::config::RiotQuestConfig;
use crate::request::RequestDescriptor;
use crate::retry::{FailureInfo, RetryPolicy};
use wave::WaveTransport;

pub const DEFAULT_CONCURRENCY: usize = 30;
pub const DEFAULT_RETRY_LIMIT: u32 = 5;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USER_AGENT: &str = "OP.GG API Client";

/// Tunables for a dispatcher. Fixed for the duration of an `exec()` run.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherConfig {
    /// Maximum transfers in flight at once (wave size).
    pub concurrency: usize,
    /// Retries allowed after the first attempt for transient failures.
    pub retry_limit: u32,
    /// Whole-transfer timeout for each attempt.
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            retry_limit: DEFAULT_RETRY_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Owns the pending queue and runs it to completion.
pub struct Dispatcher {
    api_key: String,
    config: DispatcherConfig,
    observer: Arc<dyn DispatchObserver>,
    queue: Vec<AsyncRequest>,
    executing: bool,
}

impl Dispatcher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(api_key, DispatcherConfig::default())
    }

    pub fn with_config(api_key: impl Into<String>, config: DispatcherConfig) -> Self {
        Self {
            api_key: api_key.into(),
            config,
            observer: Arc::new(NoopObserver),
            queue: Vec::new(),
            executing: false,
        }
    }

    /// Dispatcher with settings from a loaded config file. Fails if the
    /// config carries values the dispatcher cannot run with.
    pub fn from_config(
        api_key: impl Into<String>,
        cfg: &RiotQuestConfig,
    ) -> anyhow::Result<Self> {
        Ok(Self::with_config(api_key, cfg.dispatcher_config()?))
    }

    /// Replace the event observer (default: no-op).
    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DispatcherConfig {
        &mut self.config
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }

    fn standard_headers(&self) -> StandardHeaders {
        StandardHeaders {
            api_key: self.api_key.clone(),
            user_agent: self.config.user_agent.clone(),
        }
    }

    /// Queue a request. Without `on_fail`, a terminal failure aborts the
    /// `exec()` that hits it with `DispatchError::Unhandled`. Requests still
    /// queued at that point get `on_fail` with an aborted `Unknown` failure.
    pub fn add<D, F>(
        &mut self,
        descriptor: D,
        on_done: F,
        on_fail: Option<FailCallback>,
    ) -> Result<&mut Self, DispatchError>
    where
        D: RequestDescriptor + 'static,
        D::Output: 'static,
        F: FnOnce(D::Output) + 'static,
    {
        if self.executing {
            return Err(DispatchError::Executing);
        }
        let request = AsyncRequest::new(descriptor, on_done, on_fail)?;
        tracing::trace!(request = %request.template(), "queued request");
        self.queue.push(request);
        Ok(self)
    }

    /// Run one request synchronously (including retries) and return its value.
    ///
    /// Anything already queued runs in the same `exec()`.
    pub fn call<D>(&mut self, descriptor: D) -> Result<D::Output, DispatchError>
    where
        D: RequestDescriptor + 'static,
        D::Output: 'static,
    {
        let slot: Rc<RefCell<Option<Result<D::Output, FailureInfo>>>> = Rc::default();
        let done_slot = Rc::clone(&slot);
        let fail_slot = Rc::clone(&slot);
        self.add(
            descriptor,
            move |value| *done_slot.borrow_mut() = Some(Ok(value)),
            Some(Box::new(move |failure: FailureInfo| {
                *fail_slot.borrow_mut() = Some(Err(failure))
            })),
        )?;
        self.exec()?;
        let outcome = slot.borrow_mut().take();
        match outcome {
            Some(Ok(value)) => Ok(value),
            Some(Err(failure)) => Err(DispatchError::Failed(failure)),
            None => Err(DispatchError::MissingOutcome),
        }
    }

    /// Run every queued request to a terminal outcome. Blocks until the queue is empty.
    pub fn exec(&mut self) -> Result<(), DispatchError> {
        if self.queue.is_empty() {
            return Ok(());
        }
        self.executing = true;
        let result = self.run_waves();
        if let Err(ref e) = result {
            self.abort_remaining(e);
        }
        self.queue.clear();
        self.executing = false;
        result
    }

    /// Drop every queued request. In-flight transfers are not cancelled.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Fail every request still queued after `exec()` was aborted. Requests
    /// with `on_fail` get an `Unknown` failure; the others are dropped.
    fn abort_remaining(&mut self, reason: &DispatchError) {
        let failure = FailureInfo::aborted(format!("exec aborted: {}", reason));
        let mut notified = 0usize;
        for request in self.queue.iter_mut().filter(|r| !r.is_finished()) {
            if request.abort(failure.clone()) {
                notified += 1;
            }
        }
        tracing::debug!(
            queued = self.queue.len(),
            notified,
            "discarding queue after aborted exec"
        );
    }

    fn run_waves(&mut self) -> Result<(), DispatchError> {
        let concurrency = self.config.concurrency.max(1);
        let transport = WaveTransport::new(self.config.request_timeout, concurrency)?;
        let policy = RetryPolicy::new(self.config.retry_limit);
        let headers = self.standard_headers();

        while !self.queue.is_empty() {
            let wave_len = concurrency.min(self.queue.len());
            let mut wave = Vec::with_capacity(wave_len);
            for (index, request) in self.queue[..wave_len].iter_mut().enumerate() {
                let is_retry = request.attempt_count() >= 1;
                let wire = request.begin_attempt(&headers)?;
                if is_retry {
                    self.observer.request_retried(request.attempt_count(), &wire);
                }
                wave.push((index, wire));
            }
            self.observer.wave_started(wave.len());
            tracing::debug!(
                wave = wave_len,
                queued = self.queue.len(),
                "dispatching wave"
            );

            let mut unhandled: Vec<FailureInfo> = Vec::new();
            let queue = &mut self.queue;
            transport.run_wave(wave, |index, outcome| {
                let request = &mut queue[index];
                match request.settle(outcome, &policy)? {
                    Settlement::Succeeded => {}
                    Settlement::Retrying(failure) => {
                        tracing::debug!(
                            attempt = request.attempt_count(),
                            %failure,
                            "attempt failed, will retry"
                        );
                    }
                    Settlement::Failed => {
                        tracing::debug!(
                            attempt = request.attempt_count(),
                            request = %request.template(),
                            "request failed"
                        );
                    }
                    Settlement::Unhandled(failure) => {
                        tracing::error!(%failure, request = %request.template(), "unhandled request failure");
                        unhandled.push(failure);
                    }
                }
                Ok(())
            })?;

            self.queue.retain(|r| !r.is_finished());
            if !unhandled.is_empty() {
                return Err(DispatchError::Unhandled(unhandled));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("queued", &self.queue.len())
            .field("executing", &self.executing)
            .finish()
    }
}
