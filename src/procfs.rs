use std::path::Path;

use anyhow::{Context, Result};

const SELF_STATUS: &str = "/proc/self/status";

/// Resident set a swap vlastního procesu (bajty), z /proc/self/status.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResidentSet {
    pub rss_bytes: u64,
    pub swap_bytes: u64,
}

impl ResidentSet {
    pub fn rss_mb(&self) -> u64 {
        self.rss_bytes / (1024 * 1024)
    }
}

pub fn read_self() -> Result<ResidentSet> {
    read_status(Path::new(SELF_STATUS))
}

fn read_status(path: &Path) -> Result<ResidentSet> {
    let content = std::fs::read_to_string(path).context("read /proc/<pid>/status")?;
    Ok(parse_status(&content))
}

fn parse_status(content: &str) -> ResidentSet {
    let mut rss_kb = 0u64;
    let mut swap_kb = 0u64;

    for line in content.lines() {
        if line.starts_with("VmRSS:") {
            rss_kb = grab_kb(line);
        } else if line.starts_with("VmSwap:") {
            swap_kb = grab_kb(line);
        }
    }

    ResidentSet {
        rss_bytes: rss_kb * 1024,
        swap_bytes: swap_kb * 1024,
    }
}

fn grab_kb(line: &str) -> u64 {
    line.split_whitespace()
        .nth(1)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Velikost stránky systému; fallback 4096, kdyby sysconf selhal.
pub fn system_page_size() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 { 4096 } else { size as usize }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rss_and_swap() {
        let status = "Name:\tramen\nVmPeak:\t  2200000 kB\nVmRSS:\t  2101248 kB\nVmSwap:\t       0 kB\n";
        let rs = parse_status(status);

        assert_eq!(rs.rss_bytes, 2101248 * 1024);
        assert_eq!(rs.rss_mb(), 2052);
        assert_eq!(rs.swap_bytes, 0);
    }

    #[test]
    fn missing_fields_default_to_zero() {
        assert_eq!(parse_status("Name:\tramen\n"), ResidentSet::default());
    }

    #[test]
    fn page_size_is_sane() {
        let size = system_page_size();
        assert!(size >= 4096);
        assert!(size.is_power_of_two());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn reads_own_status() {
        let rs = read_self().unwrap();
        assert!(rs.rss_bytes > 0);
    }
}
