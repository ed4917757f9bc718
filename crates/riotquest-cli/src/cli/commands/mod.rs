//! CLI command handlers. Each command is in its own file.

mod call;
mod get;

pub use call::run_call;
pub use get::run_get;
