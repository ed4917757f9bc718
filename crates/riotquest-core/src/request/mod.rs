//! Request descriptors and the wire shapes the dispatcher sends and receives.
//!
//! A descriptor knows how to build one immutable `WireRequest` and how to map
//! the `RawResponse` that comes back into a typed value. The dispatcher never
//! looks past those two capabilities.

mod descriptor;
mod json;
mod platform;
mod wire;

pub use descriptor::{DescriptorError, MappingError, RequestDescriptor};
pub use json::{build_query, JsonGet};
pub use platform::Platform;
pub use wire::{Method, RawResponse, WireRequest};
