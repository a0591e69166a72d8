//! Version tuple `(major, minor, build)` and its bump rules.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use regex::Regex;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").unwrap());

/// Which component of the version to advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionField {
    /// Zero the build number, keeping major and minor.
    Reset,
    Build,
    /// Advance minor; build restarts at zero.
    Minor,
    /// Advance major; minor and build restart at zero.
    Major,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            build,
        }
    }

    /// Parse `M.m.b`, ignoring surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let caps = VERSION_RE
            .captures(trimmed)
            .ok_or_else(|| anyhow!("invalid version '{trimmed}': expected major.minor.build"))?;
        let part = |idx: usize| -> Result<u32> {
            caps[idx]
                .parse::<u32>()
                .map_err(|err| anyhow!("invalid version '{trimmed}': {err}"))
        };
        Ok(Self::new(part(1)?, part(2)?, part(3)?))
    }

    /// Return the version advanced by `field`.
    pub fn bump(self, field: VersionField) -> Result<Self> {
        let next = |value: u32, name: &str| {
            value
                .checked_add(1)
                .ok_or_else(|| anyhow!("{name} version overflow"))
        };
        Ok(match field {
            VersionField::Reset => Self { build: 0, ..self },
            VersionField::Build => Self {
                build: next(self.build, "build")?,
                ..self
            },
            VersionField::Minor => Self::new(self.major, next(self.minor, "minor")?, 0),
            VersionField::Major => Self::new(next(self.major, "major")?, 0, 0),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

impl FromStr for Version {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
