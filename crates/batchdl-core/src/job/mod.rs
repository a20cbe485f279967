//! Job records tracked by the store, plus the patches merged into them.

mod types;

pub use types::*;
