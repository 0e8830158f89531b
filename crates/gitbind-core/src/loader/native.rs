//! Native-binary loading over `libloading`.

use std::ffi::{c_char, c_int, CStr};
use std::path::Path;

use crate::error::{Error, Result};

/// External native-binary loader.
///
/// Given a directory and a file name, either load exactly one native binary
/// and hand back its entry points, or fail.
pub trait NativeApi: Send + Sync {
    fn load(&self, directory: &Path, file_name: &str) -> Result<Box<dyn NativeHandle>>;
}

/// Entry points of a loaded native binary.
pub trait NativeHandle: Send + Sync {
    /// Raw version/build string, e.g. `0.25.0+g871d13a67f.libgit2-15e1193`.
    fn version_string(&self) -> Result<String>;

    /// Raw feature bitmask.
    fn feature_bitmask(&self) -> Result<u32>;
}

const VERSION_SYMBOL: &[u8] = b"gitbind_version\0";
const FEATURES_SYMBOL: &[u8] = b"gitbind_features\0";

type VersionFn = unsafe extern "C" fn() -> *const c_char;
type FeaturesFn = unsafe extern "C" fn() -> c_int;

/// Production loader backed by `libloading`.
#[derive(Default)]
pub struct LibloadingApi;

impl LibloadingApi {
    pub fn new() -> Self {
        Self
    }
}

impl NativeApi for LibloadingApi {
    fn load(&self, directory: &Path, file_name: &str) -> Result<Box<dyn NativeHandle>> {
        let path = directory.join(file_name);
        if !path.exists() {
            return Err(Error::NotFound(path.display().to_string()));
        }

        let library = unsafe {
            libloading::Library::new(&path)
                .map_err(|e| Error::LoadFailed(format!("{}: {e}", path.display())))?
        };

        // Resolve both entry points up front so a binary missing either one
        // is rejected before it is published as loaded.
        unsafe {
            library
                .get::<VersionFn>(VERSION_SYMBOL)
                .map_err(|_| Error::SymbolNotFound("gitbind_version".to_string()))?;
            library
                .get::<FeaturesFn>(FEATURES_SYMBOL)
                .map_err(|_| Error::SymbolNotFound("gitbind_features".to_string()))?;
        }

        Ok(Box::new(LoadedLibrary { library }))
    }
}

/// Keeps the `Library` alive for the process lifetime. Dropping it would
/// invalidate every pointer handed out by the native side.
struct LoadedLibrary {
    library: libloading::Library,
}

impl NativeHandle for LoadedLibrary {
    fn version_string(&self) -> Result<String> {
        let version: libloading::Symbol<'_, VersionFn> = unsafe {
            self.library
                .get(VERSION_SYMBOL)
                .map_err(|_| Error::SymbolNotFound("gitbind_version".to_string()))?
        };
        let ptr = unsafe { version() };
        if ptr.is_null() {
            return Err(Error::LoadFailed(
                "native version entry point returned null".to_string(),
            ));
        }
        let raw = unsafe { CStr::from_ptr(ptr) };
        Ok(raw.to_string_lossy().into_owned())
    }

    fn feature_bitmask(&self) -> Result<u32> {
        let features: libloading::Symbol<'_, FeaturesFn> = unsafe {
            self.library
                .get(FEATURES_SYMBOL)
                .map_err(|_| Error::SymbolNotFound("gitbind_features".to_string()))?
        };
        Ok(unsafe { features() } as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_not_found() {
        let api = LibloadingApi::new();
        let result = api.load(Path::new("/nonexistent"), "libgit2.so");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn non_library_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("libgit2.so"), b"not a shared object").unwrap();

        let api = LibloadingApi::new();
        let result = api.load(dir.path(), "libgit2.so");
        assert!(matches!(result, Err(Error::LoadFailed(_))));
    }
}
