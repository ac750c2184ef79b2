mod common;
mod exception;
mod utils;

pub mod prelude;

#[macro_use]
pub(crate) mod macros;

pub use crate::exception::{ErrorCode, ErrorCodeBacktrace, SwfResult};
pub use utils::TextUtils;
