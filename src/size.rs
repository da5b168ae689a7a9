//! Parsing of human memory sizes ("500", "500M", "2GB", ...) into megabytes.

use crate::error::ConfigError;

pub const BYTES_PER_MB: usize = 1024 * 1024;

/// Kladný počet megabajtů, který se má spotřebovat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSpec {
    megabytes: u64,
}

impl SizeSpec {
    pub fn megabytes(&self) -> u64 {
        self.megabytes
    }

    /// Velikost v bajtech, pokud se vejde do adresního prostoru.
    pub fn bytes(&self) -> Option<usize> {
        usize::try_from(self.megabytes)
            .ok()?
            .checked_mul(BYTES_PER_MB)
    }
}

/// Suffixy v pořadí, v jakém se zkouší (delší varianta vždy první).
const SUFFIXES: [(&str, i64); 4] = [("GB", 1024), ("G", 1024), ("MB", 1), ("M", 1)];

pub fn parse_size(input: &str) -> Result<SizeSpec, ConfigError> {
    if input.is_empty() {
        return Err(ConfigError::SizeMissing);
    }

    let normalized = input.trim().to_ascii_uppercase();

    let (number, multiplier) = SUFFIXES
        .iter()
        .find_map(|(suffix, mult)| {
            normalized
                .strip_suffix(suffix)
                .map(|rest| (rest, *mult))
        })
        .unwrap_or((normalized.as_str(), 1));

    let value: i64 = number
        .parse()
        .map_err(|_| ConfigError::InvalidSize(input.to_string()))?;

    if value <= 0 {
        return Err(ConfigError::NonPositiveSize);
    }

    let megabytes = value
        .checked_mul(multiplier)
        .ok_or_else(|| ConfigError::SizeTooLarge(input.to_string()))?;

    Ok(SizeSpec {
        // value > 0 a multiplier > 0, takže převod nemůže selhat
        megabytes: megabytes as u64,
    })
}
