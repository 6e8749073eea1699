//! File version model and version predicates.
//!
//! A NIF file carries three numbers:
//!   - `file`:   the packed `a.b.c.d` engine version (`0x14020007` = 20.2.0.7)
//!   - `user`:   the licensee's user version (>= 10.0.1.8)
//!   - `stream`: the Bethesda stream version, 0 outside Bethesda files
//!
//! Every version-dependent field is gated through a [`VersionGate`] which the
//! stream engine evaluates identically when reading and when writing.

use std::fmt;

/// Pack a dotted version into its on-disk `u32` form.
pub const fn pack(a: u8, b: u8, c: u8, d: u8) -> u32 {
    ((a as u32) << 24) | ((b as u32) << 16) | ((c as u32) << 8) | d as u32
}

pub const V5_0_0_1:    u32 = pack(5, 0, 0, 1);
pub const V5_0_0_6:    u32 = pack(5, 0, 0, 6);
pub const V10_0_1_0:   u32 = pack(10, 0, 1, 0);
pub const V10_0_1_2:   u32 = pack(10, 0, 1, 2);
pub const V10_0_1_8:   u32 = pack(10, 0, 1, 8);
pub const V10_1_0_0:   u32 = pack(10, 1, 0, 0);
pub const V10_1_0_103: u32 = pack(10, 1, 0, 103);
pub const V10_1_0_104: u32 = pack(10, 1, 0, 104);
pub const V20_0_0_3:   u32 = pack(20, 0, 0, 3);
pub const V20_0_0_4:   u32 = pack(20, 0, 0, 4);
pub const V20_0_0_5:   u32 = pack(20, 0, 0, 5);
pub const V20_1_0_1:   u32 = pack(20, 1, 0, 1);
pub const V20_1_0_3:   u32 = pack(20, 1, 0, 3);
pub const V20_2_0_5:   u32 = pack(20, 2, 0, 5);
pub const V20_2_0_7:   u32 = pack(20, 2, 0, 7);

/// Oldest and newest file versions this engine reads and writes.
pub const MIN_SUPPORTED: u32 = V10_0_1_0;
pub const MAX_SUPPORTED: u32 = V20_2_0_7;

pub const GAMEBRYO_PREFIX:   &str = "Gamebryo File Format, Version ";
pub const NETIMMERSE_PREFIX: &str = "NetImmerse File Format, Version ";

// ── NiVersion ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NiVersion {
    pub file:   u32,
    pub user:   u32,
    pub stream: u32,
}

impl NiVersion {
    pub const NETIMMERSE_10: NiVersion = NiVersion::new(V10_0_1_0, 0, 0);
    pub const GAMEBRYO_20_1: NiVersion = NiVersion::new(V20_1_0_3, 0, 0);
    pub const OBLIVION:      NiVersion = NiVersion::new(V20_0_0_5, 11, 11);
    pub const FALLOUT3:      NiVersion = NiVersion::new(V20_2_0_7, 11, 34);
    pub const SKYRIM:        NiVersion = NiVersion::new(V20_2_0_7, 12, 83);
    pub const SKYRIM_SE:     NiVersion = NiVersion::new(V20_2_0_7, 12, 100);
    pub const FALLOUT4:      NiVersion = NiVersion::new(V20_2_0_7, 12, 130);

    pub const fn new(file: u32, user: u32, stream: u32) -> Self {
        Self { file, user, stream }
    }

    pub fn is_supported(&self) -> bool {
        (MIN_SUPPORTED..=MAX_SUPPORTED).contains(&self.file)
    }

    /// Whether the header carries the Bethesda export-info section.
    pub fn is_bethesda(&self) -> bool {
        let file = self.file;
        (file == V20_2_0_7
            || file == V20_0_0_5
            || ((V10_0_1_2..=V20_0_0_4).contains(&file) && self.user <= 11))
            && self.user >= 3
    }

    /// The header line written for this version, without the trailing newline.
    pub fn description(&self) -> String {
        let prefix = if self.file >= V10_1_0_0 { GAMEBRYO_PREFIX } else { NETIMMERSE_PREFIX };
        format!("{prefix}{}", format_file_version(self.file))
    }
}

impl fmt::Display for NiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (user {}, stream {})", format_file_version(self.file), self.user, self.stream)
    }
}

/// `0x14020007` → `"20.2.0.7"`.
pub fn format_file_version(file: u32) -> String {
    let [a, b, c, d] = file.to_be_bytes();
    format!("{a}.{b}.{c}.{d}")
}

/// `"20.2.0.7"` → `0x14020007`. Missing trailing components count as zero.
pub fn parse_file_version(s: &str) -> Option<u32> {
    let mut parts = [0u8; 4];
    let mut count = 0;
    for (i, part) in s.trim().split('.').enumerate() {
        if i >= 4 {
            return None;
        }
        parts[i] = part.parse().ok()?;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(pack(parts[0], parts[1], parts[2], parts[3]))
}

// ── VersionGate ───────────────────────────────────────────────────────────────

/// Predicate over the carried version: an inclusive file-version range plus
/// an optional feature test over the whole version triple.
#[derive(Clone, Copy)]
pub struct VersionGate {
    min:     u32,
    max:     u32,
    feature: Option<fn(&NiVersion) -> bool>,
}

impl VersionGate {
    pub const ALWAYS: VersionGate = VersionGate { min: 0, max: u32::MAX, feature: None };

    pub const fn since(min: u32) -> Self {
        Self { min, max: u32::MAX, feature: None }
    }

    pub const fn until(max: u32) -> Self {
        Self { min: 0, max, feature: None }
    }

    pub const fn between(min: u32, max: u32) -> Self {
        Self { min, max, feature: None }
    }

    /// Add a feature test, e.g. `|v| v.stream <= 34`.
    pub fn when(mut self, feature: fn(&NiVersion) -> bool) -> Self {
        self.feature = Some(feature);
        self
    }

    pub fn admits(&self, version: &NiVersion) -> bool {
        (self.min..=self.max).contains(&version.file)
            && self.feature.map_or(true, |f| f(version))
    }
}

impl fmt::Debug for VersionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionGate")
            .field("min", &format_file_version(self.min))
            .field("max", &format_file_version(self.max))
            .field("feature", &self.feature.is_some())
            .finish()
    }
}
