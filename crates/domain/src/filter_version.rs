use std::cmp::Ordering;
use std::fmt;

const VERSION_PARTS: usize = 4;

/// Dotted numeric filter version such as `2.1.54.7`.
///
/// Missing or non-numeric components compare as zero, so `"2.0"` equals
/// `"2.0.0.0"` and a garbage string equals `"0"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FilterVersion([u64; VERSION_PARTS]);

impl FilterVersion {
    pub fn parse(version: &str) -> Self {
        let mut parts = [0u64; VERSION_PARTS];
        for (slot, part) in parts.iter_mut().zip(version.trim().split('.')) {
            *slot = part.trim().parse::<u64>().unwrap_or(0);
        }
        Self(parts)
    }

    pub fn is_newer_than(&self, other: &FilterVersion) -> bool {
        self > other
    }

    pub fn major(&self) -> u64 {
        self.0[0]
    }

    pub fn minor(&self) -> u64 {
        self.0[1]
    }
}

impl PartialOrd for FilterVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FilterVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for FilterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

/// True when `remote` is strictly newer than `local`.
pub fn is_greater_version(remote: &str, local: &str) -> bool {
    FilterVersion::parse(remote).is_newer_than(&FilterVersion::parse(local))
}
