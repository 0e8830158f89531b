//! Runtime glue binding a managed application to the libgit2 native library.
//!
//! This crate decides, once per process, which native binary is loaded and
//! from where, then negotiates the loaded library's version and compiled-in
//! feature set. The decision is immutable after the first load: the dynamic
//! loader cannot swap a different binary into a running process image.

pub mod error;
pub mod features;
pub mod loader;
pub mod settings;
pub mod version;

pub use error::{Error, Result};
pub use features::BuiltInFeatures;
pub use loader::NativeLoader;
pub use version::{Architecture, Version};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::features::BuiltInFeatures;
    pub use crate::loader::NativeLoader;
    pub use crate::loader::native::{NativeApi, NativeHandle};
    pub use crate::version::{Architecture, Version};
}
