//! Errors raised synchronously by the dispatcher.

use super::request::InvalidTransition;
use crate::request::DescriptorError;
use crate::retry::FailureInfo;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// `add()` while `exec()` is running.
    #[error("cannot add a request while the dispatcher is executing; use a new dispatcher")]
    Executing,
    /// The descriptor could not build its wire request.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    /// `call()` target ended in a terminal failure.
    #[error("request failed: {0}")]
    Failed(FailureInfo),
    /// Terminal failures of requests added without `on_fail`, in completion
    /// order. `exec()` stopped after the wave that produced them.
    #[error("{}", describe_unhandled(.0))]
    Unhandled(Vec<FailureInfo>),
    /// The transport itself could not be driven.
    #[error("transport: {0}")]
    Transport(String),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// `call()` finished without its request reaching a terminal state.
    #[error("request settled without an outcome")]
    MissingOutcome,
}

impl DispatchError {
    /// Failure details when the error came from a request outcome.
    pub fn failure(&self) -> Option<&FailureInfo> {
        match self {
            DispatchError::Failed(f) => Some(f),
            DispatchError::Unhandled(failures) => failures.first(),
            _ => None,
        }
    }
}

fn describe_unhandled(failures: &[FailureInfo]) -> String {
    match failures {
        [] => "unhandled request failure".to_string(),
        [only] => format!("unhandled request failure: {}", only),
        [first, rest @ ..] => format!(
            "{} unhandled request failures; first: {} (+{} more)",
            failures.len(),
            first,
            rest.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::FailureKind;

    fn client(status: u32) -> FailureInfo {
        FailureInfo {
            kind: FailureKind::Client,
            status: Some(status),
            cause: format!("HTTP {}", status),
        }
    }

    #[test]
    fn unhandled_message_counts_every_failure() {
        let one = DispatchError::Unhandled(vec![client(403)]);
        assert_eq!(
            one.to_string(),
            "unhandled request failure: client error (status 403): HTTP 403"
        );

        let two = DispatchError::Unhandled(vec![client(403), client(404)]);
        let msg = two.to_string();
        assert!(msg.starts_with("2 unhandled request failures"), "{}", msg);
        assert!(msg.contains("(+1 more)"), "{}", msg);
        assert_eq!(two.failure().and_then(|f| f.status), Some(403));
    }
}
