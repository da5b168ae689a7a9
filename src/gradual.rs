//! Gradual allocation: page touching spread over a wall-clock duration.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{info, warn};

use crate::{
    alloc::{MemoryBlock, pages_to_mb},
    interrupt::Interrupt,
    size::SizeSpec,
};

/// Délka jednoho ticku.
pub const TICK: Duration = Duration::from_millis(100);

/// Výsledek růstové fáze. Buffer se vrací v obou případech, při přerušení
/// zůstávají dotčené stránky rezidentní.
pub enum GrowOutcome {
    Completed(MemoryBlock),
    Interrupted {
        block: MemoryBlock,
        allocated_mb: usize,
    },
}

/// Počítadla průběhu; žijí jen po dobu růstu.
#[derive(Debug)]
pub struct AllocationProgress {
    pub touched_pages: usize,
    pub total_pages: usize,
    pub pages_per_tick: usize,
    total_mb: usize,
    step_mb: usize,
    last_reported_mb: usize,
}

impl AllocationProgress {
    pub fn new(total_mb: usize, total_pages: usize, duration: Duration) -> Self {
        let total_ticks = ((duration.as_millis() / TICK.as_millis()) as usize).max(1);
        let pages_per_tick = (total_pages / total_ticks).max(1);

        Self {
            touched_pages: 0,
            total_pages,
            pages_per_tick,
            total_mb,
            // hlásíme po ~10 %, u malých alokací po každém MB
            step_mb: (total_mb / 10).max(1),
            last_reported_mb: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.touched_pages >= self.total_pages
    }

    /// Rozsah stránek pro další tick; posune počítadlo.
    pub fn next_batch(&mut self) -> (usize, usize) {
        let start = self.touched_pages;
        let end = (start + self.pages_per_tick).min(self.total_pages);
        self.touched_pages = end;
        (start, end)
    }

    pub fn allocated_mb(&self) -> usize {
        pages_to_mb(self.touched_pages)
    }

    /// Vrátí aktuální MB, pokud je čas ohlásit milník.
    pub fn milestone(&mut self) -> Option<usize> {
        let current = self.allocated_mb();
        if current >= self.last_reported_mb + self.step_mb || self.is_done() {
            self.last_reported_mb = current;
            Some(current)
        } else {
            None
        }
    }

    pub fn total_mb(&self) -> usize {
        self.total_mb
    }
}

/// Postupně alokuje `size` během `duration`. Přerušení se kontroluje mezi
/// ticky, nikdy uprostřed zápisu dávky.
pub async fn allocate_gradual(
    size: SizeSpec,
    bytes: usize,
    duration: Duration,
    interrupt: &mut Interrupt,
) -> GrowOutcome {
    info!(
        size_mb = size.megabytes(),
        grow_secs = duration.as_secs(),
        "gradually allocating memory"
    );

    let mut block = MemoryBlock::reserve(bytes);
    let mut progress =
        AllocationProgress::new(size.megabytes() as usize, block.total_pages(), duration);

    // první tick až po uplynutí intervalu, ne hned
    let mut ticker = interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !progress.is_done() {
        tokio::select! {
            biased;

            _ = interrupt.recv() => {
                let allocated_mb = progress.allocated_mb();
                warn!(
                    allocated_mb,
                    total_mb = progress.total_mb(),
                    "interrupted during grow phase"
                );
                return GrowOutcome::Interrupted { block, allocated_mb };
            }
            _ = ticker.tick() => {
                let (start, end) = progress.next_batch();
                block.touch_pages(start, end);

                if let Some(current) = progress.milestone() {
                    info!(
                        allocated_mb = current,
                        total_mb = progress.total_mb(),
                        "allocation progress"
                    );
                }
            }
        }
    }

    info!(
        size_mb = size.megabytes(),
        grow_secs = duration.as_secs(),
        "successfully allocated and consumed memory"
    );
    GrowOutcome::Completed(block)
}
