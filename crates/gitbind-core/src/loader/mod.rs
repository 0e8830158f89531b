//! Native library resolution: which binary, from which directory, loaded
//! exactly once per process.

pub mod native;

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::version::{Architecture, Version};
use native::{NativeApi, NativeHandle};

/// Platform-specific file name of the native binary.
pub fn native_library_file_name(os: &str) -> &'static str {
    match os {
        "windows" => "git2.dll",
        "macos" => "libgit2.dylib",
        _ => "libgit2.so",
    }
}

/// Default search order when no path has been configured: the executable's
/// own directory, then its per-architecture subdirectory.
pub fn default_search_directories(
    executable_dir: &Path,
    architecture: &Architecture,
) -> Vec<PathBuf> {
    vec![
        executable_dir.to_path_buf(),
        executable_dir.join(architecture.as_str()),
    ]
}

enum LoaderState {
    Unconfigured,
    Configured(PathBuf),
    Loaded {
        directory: PathBuf,
        descriptor: Version,
        // Held so the native library stays mapped for the process lifetime.
        _handle: Box<dyn NativeHandle>,
    },
}

/// Single authority for whether the native library has been loaded and from
/// where.
///
/// The state sits behind one mutex, so a search-path change can never be
/// observed mid-load and the "already loaded" check is atomic with respect
/// to a concurrently-completing load.
pub struct NativeLoader {
    api: Box<dyn NativeApi>,
    state: Mutex<LoaderState>,
}

impl NativeLoader {
    pub fn new(api: Box<dyn NativeApi>) -> Self {
        Self {
            api,
            state: Mutex::new(LoaderState::Unconfigured),
        }
    }

    /// Configure the directory the native binary will be loaded from.
    ///
    /// Overwriting is allowed until the first successful load. Afterwards
    /// this fails with [`Error::ConfigurationLocked`]: the dynamic loader
    /// cannot swap a different binary into a running process image. Does not
    /// itself trigger loading.
    pub fn set_search_path(&self, path: impl Into<PathBuf>) -> Result<()> {
        let mut state = self.state.lock();
        match *state {
            LoaderState::Loaded { .. } => Err(Error::ConfigurationLocked),
            _ => {
                *state = LoaderState::Configured(path.into());
                Ok(())
            }
        }
    }

    /// Configured directory before a load, the resolved directory after.
    pub fn configured_path(&self) -> Option<PathBuf> {
        match &*self.state.lock() {
            LoaderState::Unconfigured => None,
            LoaderState::Configured(path) => Some(path.clone()),
            LoaderState::Loaded { directory, .. } => Some(directory.clone()),
        }
    }

    /// Load the native library if it has not been loaded yet and return its
    /// version descriptor.
    ///
    /// The load sequence runs under the state lock: concurrent first callers
    /// serialize, exactly one performs the load, and all of them observe the
    /// same descriptor. A failed load leaves the previous state intact so the
    /// caller may reconfigure and retry.
    pub fn ensure_loaded(&self) -> Result<Version> {
        let mut state = self.state.lock();

        if let LoaderState::Loaded { descriptor, .. } = &*state {
            return Ok(descriptor.clone());
        }

        let architecture = Architecture::current();
        let candidates = match &*state {
            LoaderState::Configured(path) => vec![path.clone()],
            _ => default_search_directories(&executable_directory()?, &architecture),
        };
        let file_name = native_library_file_name(std::env::consts::OS);

        let (directory, handle) = self.probe_candidates(&candidates, file_name)?;

        let raw = handle.version_string()?;
        let bitmask = handle.feature_bitmask()?;
        let descriptor = Version::from_native_report(&raw, bitmask, architecture)?;

        tracing::info!(
            directory = %directory.display(),
            version = %descriptor,
            "native library loaded"
        );

        *state = LoaderState::Loaded {
            directory,
            descriptor: descriptor.clone(),
            _handle: handle,
        };
        Ok(descriptor)
    }

    fn probe_candidates(
        &self,
        candidates: &[PathBuf],
        file_name: &str,
    ) -> Result<(PathBuf, Box<dyn NativeHandle>)> {
        let mut last_error = None;
        for directory in candidates {
            tracing::debug!(
                directory = %directory.display(),
                file_name,
                "probing for native library"
            );
            match self.api.load(directory, file_name) {
                Ok(handle) => return Ok((directory.clone(), handle)),
                Err(err) => {
                    tracing::warn!(
                        directory = %directory.display(),
                        %err,
                        "native library candidate rejected"
                    );
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| Error::NotFound(file_name.to_string())))
    }
}

fn executable_directory() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| Error::NotFound(format!("executable path unavailable: {e}")))?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::NotFound("executable has no parent directory".to_string()))
}
