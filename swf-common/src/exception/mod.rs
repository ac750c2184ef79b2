#[allow(clippy::module_inception)]
mod exception;
mod exception_code;
mod exception_into;

pub use exception::{ErrorCode, ErrorCodeBacktrace, SwfResult};
