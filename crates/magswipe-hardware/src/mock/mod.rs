//! Mock collaborators for testing and development.
//!
//! Each mock comes with a cloneable handle used to script hardware behavior
//! and to inspect what the session asked of the device.

mod driver;
mod plug;

pub use driver::{MockDriver, MockDriverFactory, MockDriverHandle};
pub use plug::{MockPlugDetector, MockPlugHandle};
