pub mod emitter;
pub mod error;

pub use emitter::EmitterSet;
pub use error::{OutputError, Result};
