//! cgroup v2 memory limit inspection.

use std::path::Path;

use anyhow::{Context, Result};

/// Paměťové hodnoty aktuální cgroup v bajtech. `None` = bez limitu / nečitelné.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MemoryLimits {
    pub max_bytes: Option<u64>,
    pub high_bytes: Option<u64>,
    pub current_bytes: Option<u64>,
}

impl MemoryLimits {
    /// Nejnižší nastavený strop (memory.high nebo memory.max).
    pub fn effective_limit(&self) -> Option<u64> {
        match (self.max_bytes, self.high_bytes) {
            (Some(max), Some(high)) => Some(max.min(high)),
            (max, high) => max.or(high),
        }
    }

    /// Vrátí strop, pokud ho `requested` bajtů (nad aktuální spotřebou) překročí.
    pub fn exceeded_by(&self, requested: u64) -> Option<u64> {
        let limit = self.effective_limit()?;
        let projected = self.current_bytes.unwrap_or(0).saturating_add(requested);
        (projected > limit).then_some(limit)
    }
}

fn read_to_string(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?.trim().to_string())
}

/// "max" znamená bez limitu, stejně jako chybějící soubor.
fn read_limit(path: &Path) -> Result<Option<u64>> {
    if !path.exists() {
        return Ok(None);
    }

    let s = read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    if s == "max" {
        return Ok(None);
    }

    let v = s
        .parse::<u64>()
        .with_context(|| format!("parse {}: {:?}", path.display(), s))?;
    Ok(Some(v))
}

pub fn read_limits(root: &Path) -> Result<MemoryLimits> {
    Ok(MemoryLimits {
        max_bytes: read_limit(&root.join("memory.max"))?,
        high_bytes: read_limit(&root.join("memory.high"))?,
        current_bytes: read_limit(&root.join("memory.current"))?,
    })
}
