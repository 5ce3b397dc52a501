//! Toroidal window cache of grain cells.
//!
//! Holds the cells of a `w x h` window of source pixels. The window is
//! addressed through a moving top-left corner in both picture space
//! (`tl_x`, `tl_y`) and storage space (`tl_x_pos`, `tl_y_pos`), so sliding
//! it by one column or row only invalidates that column or row.
//!
//! One cache per worker; nothing here is shared between threads.

use serde::Serialize;

use super::cell::{CellProvider, GrainCell};

/// Cache activity counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Cells generated.
    pub cells_built: u64,
    /// Lookups served from a valid slot.
    pub hits: u64,
    /// Single row/column window moves.
    pub shifts: u64,
    /// Full invalidations after a far jump.
    pub flushes: u64,
}

impl CacheStats {
    pub fn merge(&mut self, other: &CacheStats) {
        self.cells_built += other.cells_built;
        self.hits += other.hits;
        self.shifts += other.shifts;
        self.flushes += other.flushes;
    }
}

#[derive(Default)]
struct Slot {
    cell: GrainCell,
    valid: bool,
}

#[derive(Default)]
pub struct CellWindowCache {
    w: usize,
    h: usize,
    tl_x: isize,
    tl_y: isize,
    tl_x_pos: usize,
    tl_y_pos: usize,
    slots: Vec<Slot>,
    stats: CacheStats,
}

impl CellWindowCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resizes the window and invalidates every slot. Cell storage is kept
    /// for reuse.
    pub fn reset(&mut self, w: usize, h: usize) {
        assert!(w > 0 && h > 0, "empty cache window {}x{}", w, h);
        self.w = w;
        self.h = h;
        self.tl_x = 0;
        self.tl_y = 0;
        self.tl_x_pos = 0;
        self.tl_y_pos = 0;
        self.slots.resize_with(w * h, Slot::default);
        for slot in &mut self.slots {
            slot.valid = false;
        }
        self.stats = CacheStats::default();
    }

    /// `(tl_x, tl_y, w, h)` of the window in picture space.
    pub fn window(&self) -> (isize, isize, usize, usize) {
        (self.tl_x, self.tl_y, self.w, self.h)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Cell of source pixel `(px, py)`, built on first use.
    pub fn use_cell<P: CellProvider + ?Sized>(&mut self, px: usize, py: usize, provider: &P) -> &GrainCell {
        let slot = self.fetch(px, py, provider);
        &self.slots[slot].cell
    }

    /// Brings the cell of `(px, py)` into the window and returns its slot.
    ///
    /// The slot stays valid until a later fetch moves the window past it.
    pub fn fetch<P: CellProvider + ?Sized>(&mut self, px: usize, py: usize, provider: &P) -> usize {
        assert!(self.w > 0, "cache used before reset");
        let (x, y) = (px as isize, py as isize);
        let (w, h) = (self.w as isize, self.h as isize);

        if !self.covers(x, y) {
            let far = x < self.tl_x - (w - 1)
                || x >= self.tl_x + 2 * w - 1
                || y < self.tl_y - (h - 1)
                || y >= self.tl_y + 2 * h - 1;
            if far {
                self.flush_at(x, y);
            } else {
                while x < self.tl_x {
                    self.move_h(-1);
                }
                while x >= self.tl_x + w {
                    self.move_h(1);
                }
                while y < self.tl_y {
                    self.move_v(-1);
                }
                while y >= self.tl_y + h {
                    self.move_v(1);
                }
            }
        }
        debug_assert!(self.covers(x, y));

        let mut c_x = (x - self.tl_x) as usize + self.tl_x_pos;
        if c_x >= self.w {
            c_x -= self.w;
        }
        let mut c_y = (y - self.tl_y) as usize + self.tl_y_pos;
        if c_y >= self.h {
            c_y -= self.h;
        }
        let idx = c_y * self.w + c_x;

        let slot = &mut self.slots[idx];
        if slot.valid {
            self.stats.hits += 1;
        } else {
            provider.build_cell(&mut slot.cell, px, py);
            slot.valid = true;
            self.stats.cells_built += 1;
        }
        idx
    }

    /// Cell stored in `slot`, as returned by [`fetch`](Self::fetch).
    #[inline]
    pub fn cell(&self, slot: usize) -> &GrainCell {
        debug_assert!(self.slots[slot].valid);
        &self.slots[slot].cell
    }

    #[inline]
    fn covers(&self, x: isize, y: isize) -> bool {
        x >= self.tl_x
            && x < self.tl_x + self.w as isize
            && y >= self.tl_y
            && y < self.tl_y + self.h as isize
    }

    fn flush_at(&mut self, x: isize, y: isize) {
        for slot in &mut self.slots {
            slot.valid = false;
        }
        self.tl_x = x;
        self.tl_y = y;
        self.tl_x_pos = 0;
        self.tl_y_pos = 0;
        self.stats.flushes += 1;
    }

    fn move_h(&mut self, d: isize) {
        let w = self.w as isize;
        let col = (self.tl_x_pos as isize + d.min(0) + w) % w;
        self.invalidate_col(col as usize);
        self.tl_x += d;
        self.tl_x_pos = ((self.tl_x_pos as isize + d + w) % w) as usize;
        self.stats.shifts += 1;
    }

    fn move_v(&mut self, d: isize) {
        let h = self.h as isize;
        let row = (self.tl_y_pos as isize + d.min(0) + h) % h;
        self.invalidate_row(row as usize);
        self.tl_y += d;
        self.tl_y_pos = ((self.tl_y_pos as isize + d + h) % h) as usize;
        self.stats.shifts += 1;
    }

    fn invalidate_col(&mut self, c_x: usize) {
        for k in 0..self.h {
            self.slots[k * self.w + c_x].valid = false;
        }
    }

    fn invalidate_row(&mut self, c_y: usize) {
        let start = c_y * self.w;
        for slot in &mut self.slots[start..start + self.w] {
            slot.valid = false;
        }
    }
}
