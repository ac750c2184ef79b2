mod properties;

pub use properties::{DeciderProperties, IdStrategy};
