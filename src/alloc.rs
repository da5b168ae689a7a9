//! Owned memory buffer whose pages are forced to be resident.

use tracing::info;

use crate::size::{BYTES_PER_MB, SizeSpec};

/// Krok, po kterém se zapisuje do bufferu. Jeden zápis na stránku stačí,
/// aby jádro stránku opravdu namapovalo na fyzickou paměť.
pub const PAGE_SIZE: usize = 4096;

/// Hodnota zapisovaná do každé stránky.
pub const TOUCH_VALUE: u8 = 1;

/// Souvislý buffer, který drží controller po celou dobu běhu.
pub struct MemoryBlock {
    buf: Vec<u8>,
}

impl MemoryBlock {
    /// Rezervuje `bytes` bajtů. Stránky zatím nejsou rezidentní.
    pub fn reserve(bytes: usize) -> Self {
        // vec![0; n] jde přes calloc, takže jádro zatím nic nenamapuje
        Self {
            buf: vec![0u8; bytes],
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.buf.len()
    }

    pub fn total_pages(&self) -> usize {
        self.buf.len().div_ceil(PAGE_SIZE)
    }

    /// Zapíše do stránek `[start, end)`. Stránky za koncem bufferu se přeskočí.
    pub fn touch_pages(&mut self, start: usize, end: usize) {
        let end = end.min(self.total_pages());
        for page in start..end {
            let offset = page * PAGE_SIZE;
            if offset < self.buf.len() {
                self.buf[offset] = TOUCH_VALUE;
            }
        }
    }

    #[cfg(test)]
    pub fn is_page_touched(&self, page: usize) -> bool {
        self.buf
            .get(page * PAGE_SIZE)
            .is_some_and(|b| *b == TOUCH_VALUE)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

/// Kolik celých MB odpovídá `pages` stránkám.
pub fn pages_to_mb(pages: usize) -> usize {
    pages * PAGE_SIZE / BYTES_PER_MB
}

/// Okamžitá alokace: rezervuje buffer a hned projde všechny stránky.
///
/// Volající musí mít `size` ověřené přes [`SizeSpec::bytes`]; při nedostatku
/// paměti rozhoduje chování platformy (abort / OOM killer).
pub fn allocate(size: SizeSpec, bytes: usize) -> MemoryBlock {
    info!(size_mb = size.megabytes(), "allocating memory");

    let mut block = MemoryBlock::reserve(bytes);
    block.touch_pages(0, block.total_pages());

    info!(
        size_mb = size.megabytes(),
        "successfully allocated and consumed memory"
    );
    block
}
