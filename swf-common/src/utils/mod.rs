mod text_utils;

pub use text_utils::TextUtils;
