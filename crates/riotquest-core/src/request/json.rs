//! JSON GET descriptor: platform host + path + query, body decoded with serde.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use super::descriptor::{DescriptorError, MappingError, RequestDescriptor};
use super::platform::Platform;
use super::wire::{RawResponse, WireRequest};

/// Build a query string from `(name, value)` pairs, skipping unset values.
///
/// Pairs keep their order; an empty result means "no query at all".
pub fn build_query(params: &[(String, Option<String>)]) -> String {
    let mut ser = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in params {
        if let Some(v) = value {
            ser.append_pair(name, v);
        }
    }
    ser.finish()
}

/// GET request whose JSON response body is decoded into `T`.
#[derive(Debug, Clone)]
pub struct JsonGet<T> {
    base: String,
    path: String,
    params: Vec<(String, Option<String>)>,
    _output: PhantomData<fn() -> T>,
}

impl<T> JsonGet<T> {
    /// Request `path` on the API host of `platform` over HTTPS.
    pub fn new(platform: Platform, path: impl Into<String>) -> Self {
        Self::with_base(format!("https://{}", platform.api_host()), path)
    }

    /// Request `path` relative to an explicit base URL (scheme + host).
    pub fn with_base(base: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            path: path.into(),
            params: Vec::new(),
            _output: PhantomData,
        }
    }

    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_string(), Some(value.to_string())));
        self
    }

    /// Adds the parameter only when `value` is set.
    pub fn opt_param<V: ToString>(mut self, name: &str, value: Option<V>) -> Self {
        self.params
            .push((name.to_string(), value.map(|v| v.to_string())));
        self
    }

    pub fn url(&self) -> String {
        let mut url = format!(
            "{}/{}",
            self.base.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        let query = build_query(&self.params);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        url
    }
}

impl<T: DeserializeOwned> RequestDescriptor for JsonGet<T> {
    type Output = T;

    fn build_wire_request(&self) -> Result<WireRequest, DescriptorError> {
        let url = self.url();
        url::Url::parse(&url).map_err(|source| DescriptorError::InvalidUrl {
            url: url.clone(),
            source,
        })?;
        let mut request = WireRequest::get(url);
        request
            .headers
            .push(("Accept".to_string(), "application/json".to_string()));
        Ok(request)
    }

    fn map_response(&self, raw: &RawResponse) -> Result<T, MappingError> {
        Ok(serde_json::from_slice(&raw.body)?)
    }
}
