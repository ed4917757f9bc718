//! Curl multi transport for one `exec()` run: sends a wave of requests
//! concurrently and reports each completion, one at a time, on the calling thread.

use std::time::Duration;

use curl::easy::{Easy2, List};
use curl::multi::{Easy2Handle, Multi};

use super::error::DispatchError;
use super::handler::ResponseCollector;
use super::request::AttemptOutcome;
use crate::request::{Method, RawResponse, WireRequest};
use crate::retry::FailureInfo;

const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Connection pool + settings shared by every wave of one `exec()` run.
pub(super) struct WaveTransport {
    multi: Multi,
    timeout: Duration,
}

impl WaveTransport {
    pub(super) fn new(timeout: Duration, max_connections: usize) -> Result<Self, DispatchError> {
        let mut multi = Multi::new();
        multi
            .set_max_total_connections(max_connections)
            .map_err(|e| DispatchError::Transport(format!("curl multi setup: {}", e)))?;
        Ok(Self { multi, timeout })
    }

    /// Dispatch every `(index, request)` pair concurrently and call `on_complete`
    /// once per pair as transfers finish. Returns when the whole wave has settled.
    pub(super) fn run_wave<F>(
        &self,
        wave: Vec<(usize, WireRequest)>,
        mut on_complete: F,
    ) -> Result<(), DispatchError>
    where
        F: FnMut(usize, AttemptOutcome) -> Result<(), DispatchError>,
    {
        let mut active: Vec<(Easy2Handle<ResponseCollector>, usize)> =
            Vec::with_capacity(wave.len());

        for (index, request) in wave {
            match self.configure(&request) {
                Ok(easy) => {
                    let handle = self
                        .multi
                        .add2(easy)
                        .map_err(|e| DispatchError::Transport(format!("curl multi add: {}", e)))?;
                    active.push((handle, index));
                }
                // Options curl refuses for this request are this request's failure only.
                Err(e) => on_complete(index, AttemptOutcome::Transport(FailureInfo::from_curl(&e)))?,
            }
        }

        while !active.is_empty() {
            let running = self
                .multi
                .perform()
                .map_err(|e| DispatchError::Transport(format!("curl multi perform: {}", e)))?;

            let mut completed: Vec<(usize, Result<(), curl::Error>)> = Vec::new();
            self.multi.messages(|msg| {
                for (pos, (handle, _)) in active.iter().enumerate() {
                    if let Some(result) = msg.result_for2(handle) {
                        completed.push((pos, result));
                        break;
                    }
                }
            });
            // Remove from the back so earlier positions stay valid.
            completed.sort_by(|a, b| b.0.cmp(&a.0));

            for (pos, result) in completed {
                let (handle, index) = active.remove(pos);
                let mut easy = self
                    .multi
                    .remove2(handle)
                    .map_err(|e| DispatchError::Transport(format!("curl multi remove: {}", e)))?;
                let outcome = match result {
                    Err(e) => AttemptOutcome::Transport(FailureInfo::from_curl(&e)),
                    Ok(()) => {
                        let status = easy.response_code().unwrap_or(0);
                        let collected = std::mem::take(easy.get_mut());
                        AttemptOutcome::Response(RawResponse {
                            status,
                            headers: collected.headers,
                            body: collected.body,
                        })
                    }
                };
                on_complete(index, outcome)?;
            }

            if running > 0 {
                self.multi
                    .wait(&mut [], WAIT_SLICE)
                    .map_err(|e| DispatchError::Transport(format!("curl multi wait: {}", e)))?;
            }
        }
        Ok(())
    }

    fn configure(&self, request: &WireRequest) -> Result<Easy2<ResponseCollector>, curl::Error> {
        let mut easy = Easy2::new(ResponseCollector::default());
        easy.url(&request.url)?;
        easy.timeout(self.timeout)?;
        easy.connect_timeout(self.timeout)?;
        // Setting a body switches libcurl to POST; the method string must be set explicitly afterwards.
        if let Some(body) = &request.body {
            easy.post_fields_copy(body)?;
        }
        match request.method {
            Method::Get if request.body.is_none() => easy.get(true)?,
            Method::Post => easy.post(true)?,
            Method::Get | Method::Put | Method::Delete => {
                easy.custom_request(request.method.as_str())?
            }
        }
        let mut list = List::new();
        for (name, value) in &request.headers {
            list.append(&format!("{}: {}", name.trim(), value.trim()))?;
        }
        easy.http_headers(list)?;
        Ok(easy)
    }
}
