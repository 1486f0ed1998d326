//! Testing utilities and harness for stratum

pub mod loader;
pub mod testing;

pub use loader::RecordingLoader;
pub use testing::*;

pub mod prelude {
    pub use crate::loader::*;
    pub use crate::testing::*;
}
