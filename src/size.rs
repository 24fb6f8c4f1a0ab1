//! Byte sizes in the notation 7-Zip volume switches use, and the split-size
//! arithmetic that keeps every volume under the hosting per-file limit.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const GIB: u64 = 1024 * MIB;

/// Smallest volume size accepted for splitting.
pub const MIN_SPLIT_SIZE: u64 = KIB;

/// A byte count such as `40m` or `1g`. Units are binary multiples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ByteSize(u64);

impl ByteSize {
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn bytes(self) -> u64 {
        self.0
    }

    /// The `-v` switch handed to 7-Zip.
    pub fn to_7z_switch(self) -> String {
        format!("-v{self}")
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0;
        if n != 0 && n % GIB == 0 {
            write!(f, "{}g", n / GIB)
        } else if n != 0 && n % MIB == 0 {
            write!(f, "{}m", n / MIB)
        } else if n != 0 && n % KIB == 0 {
            write!(f, "{}k", n / KIB)
        } else {
            write!(f, "{n}b")
        }
    }
}

impl FromStr for ByteSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidSize {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty size"));
        }
        let split_at = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, unit) = trimmed.split_at(split_at);
        if digits.is_empty() {
            return Err(invalid("expected a number, e.g. 40m"));
        }
        let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
            "" | "b" => 1,
            "k" | "kb" | "kib" => KIB,
            "m" | "mb" | "mib" => MIB,
            "g" | "gb" | "gib" => GIB,
            _ => return Err(invalid("unknown unit, use b, k, m or g")),
        };
        let value: u64 = digits.parse().map_err(|_| invalid("number too large"))?;
        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| invalid("number too large"))?;
        if bytes == 0 {
            return Err(invalid("size must be greater than zero"));
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for ByteSize {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ByteSize> for String {
    fn from(value: ByteSize) -> Self {
        value.to_string()
    }
}

/// A volume size that has been checked against the hosting per-file limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSize {
    pub size: ByteSize,
    /// True when the requested size was lowered to fit the limit.
    pub clamped: bool,
}

/// Largest volume size allowed under `file_limit`: 95% of the limit,
/// rounded down to a whole MiB (or KiB for limits under a few MiB).
/// Limits of about 1 KiB or less yield 0.
pub fn split_ceiling(file_limit: ByteSize) -> u64 {
    let ceiling = file_limit.bytes() / 20 * 19;
    if ceiling >= MIB {
        ceiling / MIB * MIB
    } else {
        ceiling / KIB * KIB
    }
}

/// Returns the volume size to hand to 7-Zip for `requested`. The result
/// never exceeds `file_limit`.
///
/// # Errors
/// Returns [`Error::InvalidSize`] when `requested` is below [`MIN_SPLIT_SIZE`]
/// or `file_limit` leaves no room for a volume of that size.
pub fn safe_split_size(requested: ByteSize, file_limit: ByteSize) -> Result<SplitSize> {
    if requested.bytes() < MIN_SPLIT_SIZE {
        return Err(Error::InvalidSize {
            input: requested.to_string(),
            reason: format!("split size must be at least {}", ByteSize(MIN_SPLIT_SIZE)),
        });
    }
    let ceiling = split_ceiling(file_limit);
    if ceiling < MIN_SPLIT_SIZE {
        return Err(Error::InvalidSize {
            input: file_limit.to_string(),
            reason: format!(
                "file limit is too small for the minimum split size of {}",
                ByteSize(MIN_SPLIT_SIZE)
            ),
        });
    }
    if requested.bytes() > ceiling {
        log::warn!(
            "Split size {requested} exceeds the safe size for a {file_limit} file limit; using {}",
            ByteSize(ceiling)
        );
        Ok(SplitSize {
            size: ByteSize(ceiling),
            clamped: true,
        })
    } else {
        Ok(SplitSize {
            size: requested,
            clamped: false,
        })
    }
}

/// Number of volumes needed for `total` bytes at `split` bytes per volume.
pub fn estimate_parts(total: u64, split: ByteSize) -> u64 {
    total.div_ceil(split.bytes().max(1))
}

/// Human readable MiB figure used in progress messages.
pub fn format_mib(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / MIB as f64)
}
