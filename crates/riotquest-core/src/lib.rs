pub mod config;
pub mod logging;

pub mod dispatcher;
pub mod request;
pub mod retry;

pub use dispatcher::{DispatchError, Dispatcher, DispatcherConfig};
pub use request::{RequestDescriptor, WireRequest};
pub use retry::{FailureInfo, FailureKind};
