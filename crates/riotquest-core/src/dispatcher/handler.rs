//! Easy2 handler that buffers one response (headers and body).

use std::str;

/// Collects the response of a single transfer.
#[derive(Debug, Default)]
pub(super) struct ResponseCollector {
    pub(super) headers: Vec<String>,
    pub(super) body: Vec<u8>,
}

impl curl::easy::Handler for ResponseCollector {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(s) = str::from_utf8(data) {
            let line = s.trim_end();
            // A new status line (e.g. after `100 Continue`) starts a fresh header block.
            if line.starts_with("HTTP/") {
                self.headers.clear();
            }
            if !line.is_empty() {
                self.headers.push(line.to_string());
            }
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        self.body.extend_from_slice(data);
        Ok(data.len())
    }
}
