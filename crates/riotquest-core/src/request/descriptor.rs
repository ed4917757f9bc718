//! The two capabilities a caller supplies for every request.

use super::wire::{RawResponse, WireRequest};

/// Describes one API request: how to build it and how to read its response.
///
/// `build_wire_request` must be pure; the dispatcher may call it again for
/// every attempt and expects the same request each time.
pub trait RequestDescriptor {
    /// Typed value produced from a successful response.
    type Output;

    fn build_wire_request(&self) -> Result<WireRequest, DescriptorError>;

    fn map_response(&self, raw: &RawResponse) -> Result<Self::Output, MappingError>;
}

/// The descriptor could not produce a valid wire request.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("invalid request URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid request: {0}")]
    Invalid(String),
}

/// The response body did not match the shape the descriptor expects.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("response body is not the expected JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected response: {0}")]
    Shape(String),
}
