//! Version descriptor for the loaded native library.
//!
//! The canonical string form is the one the host application logs and the
//! one round-trip tested by the tooling:
//!
//! ```text
//! <major>.<minor>.<patch>[-<pre>]+[g<buildHash>.]libgit2-<nativeHash> (<arch> - <feature1>, <feature2>, ...)
//! ```
//!
//! Example: `0.25.0-preview.52+g871d13a67f.libgit2-15e1193 (x86 - Threads, Https)`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::features::BuiltInFeatures;

/// Target architecture of the loaded native binary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Architecture {
    X86,
    X64,
    Other(String),
}

impl Architecture {
    /// Architecture of the running process.
    pub fn current() -> Self {
        match std::env::consts::ARCH {
            "x86" => Self::X86,
            "x86_64" => Self::X64,
            other => Self::Other(other.to_string()),
        }
    }

    /// Grammar tag, e.g. `x86` or `x64`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::X86 => "x86",
            Self::X64 => "x64",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Architecture {
    fn from(tag: &str) -> Self {
        match tag {
            "x86" => Self::X86,
            "x64" => Self::X64,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Immutable version descriptor of the loaded native library.
///
/// Created exactly once per process, on the first query that needs the
/// native library, and cached for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    binding: semver::Version,
    pre_release: Option<String>,
    build_hash: Option<String>,
    native_hash: String,
    architecture: Architecture,
    features: BuiltInFeatures,
}

/// Raw native-reported segment: `maj.min.patch[-pre]+[g<hash>.]libgit2-<hash>`.
static REPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(?:-(?P<pre>[\w.-]+))?\+(?:g(?P<build>[0-9a-f]+)\.)?libgit2-(?P<native>[0-9a-f]+)$",
    )
    .expect("report pattern is valid")
});

/// Full canonical form: report segment plus ` (<arch> - <features>)`.
static CANONICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<report>\S+) \((?P<arch>\w+) - (?P<features>[\w, ]*)\)$")
        .expect("canonical pattern is valid")
});

impl Version {
    /// Assemble a descriptor from already-validated parts.
    ///
    /// A pre-release tag carried inside `binding` is lifted into the
    /// descriptor's own tag field; the grammar permits tags (word characters,
    /// `-`, `.`) that `semver::Prerelease` cannot hold, so the tag is stored
    /// as a plain string. Build metadata in `binding` is discarded: the
    /// grammar's `+` segment is owned by the hash fields.
    pub fn new(
        mut binding: semver::Version,
        build_hash: Option<String>,
        native_hash: String,
        architecture: Architecture,
        features: BuiltInFeatures,
    ) -> Self {
        let pre_release = if binding.pre.is_empty() {
            None
        } else {
            Some(binding.pre.as_str().to_string())
        };
        binding.pre = semver::Prerelease::EMPTY;
        binding.build = semver::BuildMetadata::EMPTY;
        Self {
            binding,
            pre_release,
            build_hash,
            native_hash,
            architecture,
            features,
        }
    }

    /// Assemble a descriptor from the values the native library reports at
    /// load time: its raw version/build string and its feature bitmask.
    ///
    /// This is the live construction path; [`Version::from_str`] exists for
    /// tests and tooling only.
    pub fn from_native_report(
        raw: &str,
        bitmask: u32,
        architecture: Architecture,
    ) -> Result<Self> {
        let (binding, pre_release, build_hash, native_hash) = parse_report(raw)?;
        Ok(Self {
            binding,
            pre_release,
            build_hash,
            native_hash,
            architecture,
            features: BuiltInFeatures::from_raw(bitmask),
        })
    }

    /// Numeric triple of the binding. The pre-release tag lives in
    /// [`pre_release`](Self::pre_release).
    pub fn binding(&self) -> &semver::Version {
        &self.binding
    }

    /// Pre-release tag, e.g. `preview.52`.
    pub fn pre_release(&self) -> Option<&str> {
        self.pre_release.as_deref()
    }

    /// Short hex hash of the binding's own source state, when stamped in.
    pub fn build_hash(&self) -> Option<&str> {
        self.build_hash.as_deref()
    }

    /// Short hex hash of the native library's build. Always present.
    pub fn native_hash(&self) -> &str {
        &self.native_hash
    }

    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    /// Capabilities compiled into the native library.
    pub fn features(&self) -> BuiltInFeatures {
        self.features
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.binding.major, self.binding.minor, self.binding.patch
        )?;
        if let Some(pre) = &self.pre_release {
            write!(f, "-{pre}")?;
        }
        f.write_str("+")?;
        if let Some(hash) = &self.build_hash {
            write!(f, "g{hash}.")?;
        }
        write!(f, "libgit2-{}", self.native_hash)?;
        // Zero features render as an empty segment: "(x64 - )".
        write!(
            f,
            " ({} - {})",
            self.architecture,
            self.features.display_list().join(", ")
        )
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let captures = CANONICAL_RE
            .captures(s)
            .ok_or_else(|| Error::Parse(s.to_string()))?;

        let (binding, pre_release, build_hash, native_hash) = parse_report(&captures["report"])?;
        let architecture = Architecture::from(&captures["arch"]);

        let mut features = BuiltInFeatures::empty();
        let list = &captures["features"];
        if !list.is_empty() {
            for name in list.split(", ") {
                let flag = BuiltInFeatures::from_display_name(name)
                    .ok_or_else(|| Error::Parse(format!("unknown feature name: {name}")))?;
                features |= flag;
            }
        }

        Ok(Self {
            binding,
            pre_release,
            build_hash,
            native_hash,
            architecture,
            features,
        })
    }
}

type ReportParts = (semver::Version, Option<String>, Option<String>, String);

fn parse_report(raw: &str) -> Result<ReportParts> {
    let captures = REPORT_RE
        .captures(raw)
        .ok_or_else(|| Error::Parse(raw.to_string()))?;

    let binding = semver::Version::new(
        parse_component(&captures["major"], raw)?,
        parse_component(&captures["minor"], raw)?,
        parse_component(&captures["patch"], raw)?,
    );
    // The tag stays a plain string: the grammar's character class is wider
    // than semver pre-release identifiers (underscores, leading zeros).
    let pre_release = captures.name("pre").map(|m| m.as_str().to_string());
    let build_hash = captures.name("build").map(|m| m.as_str().to_string());
    let native_hash = captures["native"].to_string();

    Ok((binding, pre_release, build_hash, native_hash))
}

fn parse_component(text: &str, raw: &str) -> Result<u64> {
    text.parse()
        .map_err(|e| Error::Parse(format!("invalid version number in {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_version() -> Version {
        Version::new(
            semver::Version::parse("0.25.0-preview.52").unwrap(),
            Some("871d13a67f".to_string()),
            "15e1193".to_string(),
            Architecture::X86,
            BuiltInFeatures::THREADS | BuiltInFeatures::HTTPS,
        )
    }

    #[test]
    fn formats_reference_string() {
        assert_eq!(
            reference_version().to_string(),
            "0.25.0-preview.52+g871d13a67f.libgit2-15e1193 (x86 - Threads, Https)"
        );
    }

    #[test]
    fn formats_without_optional_fields() {
        let version = Version::new(
            semver::Version::new(1, 2, 3),
            None,
            "abcdef1".to_string(),
            Architecture::X64,
            BuiltInFeatures::THREADS,
        );
        assert_eq!(version.to_string(), "1.2.3+libgit2-abcdef1 (x64 - Threads)");
    }

    #[test]
    fn zero_features_render_as_empty_segment() {
        let version = Version::new(
            semver::Version::new(0, 1, 0),
            None,
            "abc1234".to_string(),
            Architecture::X64,
            BuiltInFeatures::empty(),
        );
        assert_eq!(version.to_string(), "0.1.0+libgit2-abc1234 (x64 - )");
        assert_eq!(version.to_string().parse::<Version>().unwrap(), version);
    }

    #[test]
    fn round_trips_through_canonical_form() {
        let values = [
            reference_version(),
            Version::new(
                semver::Version::new(1, 2, 3),
                None,
                "abcdef1".to_string(),
                Architecture::X64,
                BuiltInFeatures::all(),
            ),
            Version::new(
                semver::Version::parse("10.0.1-rc.1").unwrap(),
                Some("0123456789".to_string()),
                "deadbee".to_string(),
                Architecture::Other("arm64".to_string()),
                BuiltInFeatures::HTTPS | BuiltInFeatures::SSH,
            ),
        ];
        for value in values {
            let reparsed: Version = value.to_string().parse().unwrap();
            assert_eq!(reparsed, value);
        }
    }

    #[test]
    fn parses_from_native_report() {
        let version =
            Version::from_native_report("1.2.3+g0000000000.libgit2-abcdef1", 0b11, Architecture::X64)
                .unwrap();
        assert_eq!(version.binding(), &semver::Version::new(1, 2, 3));
        assert_eq!(version.build_hash(), Some("0000000000"));
        assert_eq!(version.native_hash(), "abcdef1");
        assert_eq!(
            version.features(),
            BuiltInFeatures::THREADS | BuiltInFeatures::HTTPS
        );
    }

    #[test]
    fn native_report_without_build_hash() {
        let version =
            Version::from_native_report("0.26.0+libgit2-15e1193", 0b1, Architecture::X86).unwrap();
        assert_eq!(version.build_hash(), None);
        assert_eq!(version.to_string(), "0.26.0+libgit2-15e1193 (x86 - Threads)");
    }

    #[test]
    fn pre_release_accepts_full_word_character_class() {
        // Underscores and leading-zero identifiers are valid tag characters
        // even though semver pre-release identifiers reject them.
        let version: Version = "1.2.3-pre_view+libgit2-abcdef1 (x64 - Threads)"
            .parse()
            .unwrap();
        assert_eq!(version.pre_release(), Some("pre_view"));
        assert_eq!(
            version.to_string(),
            "1.2.3-pre_view+libgit2-abcdef1 (x64 - Threads)"
        );

        let reported = Version::from_native_report(
            "0.25.0-preview.052+libgit2-15e1193",
            0b1,
            Architecture::X86,
        )
        .unwrap();
        assert_eq!(reported.pre_release(), Some("preview.052"));
    }

    #[test]
    fn pre_release_is_lifted_out_of_the_semver_value() {
        let version = reference_version();
        assert_eq!(version.pre_release(), Some("preview.52"));
        assert!(version.binding().pre.is_empty());
    }

    #[test]
    fn rejects_malformed_input() {
        let malformed = [
            "",
            "1.2.3",
            "1.2.3 (x64 - Threads)",
            "1.2.3+libgit-abcdef1 (x64 - Threads)",
            "1.2.3+libgit2-ABCDEF1 (x64 - Threads)",
            "1.2.3+libgit2-abcdef1 (x64 - Threads, Nope)",
            "1.2.3+g.libgit2-abcdef1 (x64 - Threads)",
            "not a version at all",
        ];
        for input in malformed {
            assert!(
                matches!(input.parse::<Version>(), Err(Error::Parse(_))),
                "expected parse failure for {input:?}"
            );
        }
    }

    #[test]
    fn hash_lengths_are_not_hard_coded() {
        let version: Version = "1.2.3+gabc.libgit2-ff (x64 - Threads)".parse().unwrap();
        assert_eq!(version.build_hash(), Some("abc"));
        assert_eq!(version.native_hash(), "ff");
    }

    #[test]
    fn architecture_tags() {
        assert_eq!(Architecture::from("x86"), Architecture::X86);
        assert_eq!(Architecture::from("x64"), Architecture::X64);
        assert_eq!(
            Architecture::from("arm64"),
            Architecture::Other("arm64".to_string())
        );
        assert_eq!(Architecture::X64.to_string(), "x64");
    }
}
