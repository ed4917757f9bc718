//! Classify HTTP status and curl errors into failure kinds.

use super::failure::FailureKind;

/// Classify a non-success HTTP status code.
pub fn classify_http_status(code: u32) -> FailureKind {
    match code {
        code if code >= 500 => FailureKind::Server,
        400..=499 => FailureKind::Client,
        _ => FailureKind::Unknown,
    }
}

/// Classify a curl error. Anything that means "no response was received"
/// is a connection error.
pub fn classify_curl_error(e: &curl::Error) -> FailureKind {
    if e.is_operation_timedout()
        || e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_ssl_connect_error()
        || e.is_partial_file()
    {
        return FailureKind::Connection;
    }
    FailureKind::Unknown
}
