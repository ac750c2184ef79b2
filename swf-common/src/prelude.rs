#[rustfmt::skip]
// std
pub use std::cmp::Ordering;
pub use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
pub use std::ops::ControlFlow;
pub use std::sync::Arc;

#[rustfmt::skip]
pub type InlineStr = smartstring::SmartString<smartstring::Compact>;
pub use lazy_static::lazy_static;
pub use once_cell::sync::{Lazy, OnceCell};

#[rustfmt::skip]
pub use log::Level::{
    Debug as LogLevelDebug, Info as LogLevelInfo, Trace as LogLevelTrace, Warn as LogLevelWarn,
};
pub use log::{debug, error, info, log_enabled, trace, warn, LevelFilter};

#[rustfmt::skip]
pub use crate::common::Object;
pub use crate::exception::{ErrorCode, SwfResult};
pub use crate::{fmt_err, str_err};
