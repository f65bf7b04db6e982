//! Invocation configuration and the global settings store

mod invocation;
mod settings;

pub use invocation::*;
pub use settings::*;
