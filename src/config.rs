use std::{env, path::PathBuf, time::Duration};

use crate::{
    error::ConfigError,
    size::{SizeSpec, parse_size},
};

#[derive(Debug, Clone)]
pub struct Config {
    pub size: SizeSpec,

    /// Velikost v bajtech, ověřená proti adresnímu prostoru.
    pub size_bytes: usize,

    /// Jak dlouho čekat před alokací. Nula = začít hned.
    pub wait: Duration,

    /// Za jak dlouho dorůst na cílovou velikost. Nula = alokovat najednou.
    pub grow: Duration,

    /// Kořen cgroup v2, ze kterého se čte memory.max / memory.current.
    pub cgroup_root: PathBuf,
}

impl Config {
    /// Ověří všechny vstupy najednou; žádná fáze se nespustí, dokud
    /// neprojde celá konfigurace.
    pub fn new(size: &str, wait_secs: i64, grow_secs: i64) -> Result<Self, ConfigError> {
        let size = parse_size(size)?;
        let size_bytes = size
            .bytes()
            .ok_or_else(|| ConfigError::SizeTooLarge(format!("{} MB", size.megabytes())))?;

        if wait_secs < 0 {
            return Err(ConfigError::NegativeWait(wait_secs));
        }
        if grow_secs < 0 {
            return Err(ConfigError::NegativeGrowTime(grow_secs));
        }

        let cgroup_root = env::var("CGROUP_ROOT").unwrap_or_else(|_| "/sys/fs/cgroup".to_string());

        Ok(Self {
            size,
            size_bytes,
            wait: Duration::from_secs(wait_secs as u64),
            grow: Duration::from_secs(grow_secs as u64),
            cgroup_root: PathBuf::from(cgroup_root),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_defaults() {
        let cfg = Config::new("2G", 0, 0).unwrap();
        assert_eq!(cfg.size.megabytes(), 2048);
        assert_eq!(cfg.size_bytes, 2048 * 1024 * 1024);
        assert_eq!(cfg.wait, Duration::ZERO);
        assert_eq!(cfg.grow, Duration::ZERO);
    }

    #[test]
    fn converts_seconds() {
        let cfg = Config::new("100", 3, 7).unwrap();
        assert_eq!(cfg.wait, Duration::from_secs(3));
        assert_eq!(cfg.grow, Duration::from_secs(7));
    }

    #[test]
    fn rejects_invalid_size() {
        assert_eq!(Config::new("0", 0, 0).unwrap_err(), ConfigError::NonPositiveSize);
        assert_eq!(Config::new("-1m", 0, 0).unwrap_err(), ConfigError::NonPositiveSize);
        assert_eq!(Config::new("", 0, 0).unwrap_err(), ConfigError::SizeMissing);
    }

    #[test]
    fn rejects_negative_durations() {
        assert_eq!(
            Config::new("10", -1, 0).unwrap_err(),
            ConfigError::NegativeWait(-1)
        );
        assert_eq!(
            Config::new("10", 0, -5).unwrap_err(),
            ConfigError::NegativeGrowTime(-5)
        );
    }

    #[test]
    fn bad_grow_time_rejected_even_with_wait() {
        // grow se musí odmítnout dřív, než by se začalo čekat
        assert_eq!(
            Config::new("10", 30, -1).unwrap_err(),
            ConfigError::NegativeGrowTime(-1)
        );
    }
}
