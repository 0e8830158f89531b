//! Process-wide facade over the native loader singleton.
//!
//! This is the only surface the host application touches: read the version
//! (loading the native library on first use) and get or set the native
//! library search path. Call sites never deal with the loader's locking.

use std::path::PathBuf;

use once_cell::sync::Lazy;

use crate::error::Result;
use crate::loader::native::LibloadingApi;
use crate::loader::NativeLoader;
use crate::version::Version;

static LOADER: Lazy<NativeLoader> =
    Lazy::new(|| NativeLoader::new(Box::new(LibloadingApi::new())));

/// Version descriptor of the native library, loading it on first use.
pub fn version() -> Result<Version> {
    LOADER.ensure_loaded()
}

/// Directory the native library is (or will be) loaded from.
pub fn native_library_path() -> Option<PathBuf> {
    LOADER.configured_path()
}

/// Set the directory the native library will be loaded from.
///
/// Fails with [`Error::ConfigurationLocked`](crate::Error::ConfigurationLocked)
/// once the library has been loaded.
pub fn set_native_library_path(path: impl Into<PathBuf>) -> Result<()> {
    LOADER.set_search_path(path)
}
