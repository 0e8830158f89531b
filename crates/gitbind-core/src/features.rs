//! Optional capabilities compiled into the native library.

bitflags::bitflags! {
    /// Bitset of optional capabilities reported by the loaded native library.
    ///
    /// Bit layout is a compatibility contract: a new capability appends a new
    /// bit, existing bits are never reassigned.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BuiltInFeatures: u32 {
        /// The native library was built with multi-threading support
        const THREADS = 1 << 0;
        /// Https remote transports are supported
        const HTTPS = 1 << 1;
        /// Ssh remote transports are supported
        const SSH = 1 << 2;
        /// Nanosecond-resolution file timestamps are supported
        const NSEC = 1 << 3;
    }
}

/// Display names, in canonical declaration order.
const DISPLAY_NAMES: &[(BuiltInFeatures, &str)] = &[
    (BuiltInFeatures::THREADS, "Threads"),
    (BuiltInFeatures::HTTPS, "Https"),
    (BuiltInFeatures::SSH, "Ssh"),
    (BuiltInFeatures::NSEC, "Nsec"),
];

impl BuiltInFeatures {
    /// Build from the raw bitmask reported by the native library.
    ///
    /// Total function: bits this build does not know about are preserved, so
    /// a newer native library never breaks formatting. Unknown bits are not
    /// named by [`display_list`](Self::display_list).
    pub fn from_raw(bits: u32) -> Self {
        Self::from_bits_retain(bits)
    }

    /// Raw bitmask, including preserved unknown bits.
    pub fn raw(self) -> u32 {
        self.bits()
    }

    /// Names of the known capabilities present, in declaration order.
    pub fn display_list(self) -> Vec<&'static str> {
        DISPLAY_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Inverse of the display names, used when parsing the canonical grammar.
    ///
    /// Distinct from the `bitflags`-generated `from_name`, which matches flag
    /// identifiers like `THREADS` rather than the grammar's display names.
    pub fn from_display_name(name: &str) -> Option<Self> {
        DISPLAY_NAMES
            .iter()
            .find(|(_, known)| *known == name)
            .map(|(flag, _)| *flag)
    }
}
