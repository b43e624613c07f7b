//! LC-3 memory subsystem.
//!
//! A flat array of 65536 sixteen-bit words. Addresses are `u16`, so every
//! address the CPU can form is in range and address arithmetic simply wraps.

use serde::{Serialize, Deserialize};

/// The number of addressable words.
pub const MEMORY_SIZE: usize = 1 << 16;

/// LC-3 memory: 65536 sixteen-bit cells.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<u16>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u16 {
        self.cells[addr as usize]
    }

    #[inline]
    pub fn write(&mut self, addr: u16, value: u16) {
        self.cells[addr as usize] = value;
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Copy `words` into memory starting at `start`.
    ///
    /// Copying stops at the last cell (0xFFFF) rather than wrapping to low
    /// memory; anything past it is dropped. Returns the number of words
    /// actually written.
    pub fn load(&mut self, start: u16, words: &[u16]) -> usize {
        let start = start as usize;
        let count = words.len().min(MEMORY_SIZE - start);
        self.cells[start..start + count].copy_from_slice(&words[..count]);
        count
    }

    /// Iterate over the cells from `start` up to the end of memory.
    ///
    /// Never wraps around to address 0.
    pub fn cells_from(&self, start: u16) -> impl Iterator<Item = u16> + '_ {
        self.cells[start as usize..].iter().copied()
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: u16, count: usize) -> Vec<(u16, u16)> {
        (start as usize..MEMORY_SIZE)
            .take(count)
            .map(|i| (i as u16, self.cells[i]))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only show non-zero cells
        let non_zero = self.cells.iter().filter(|cell| **cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}
