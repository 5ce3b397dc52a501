//! Strided float planes.
//!
//! Pixel buffers come from the host as raw planes of 32-bit float samples
//! with a row stride (in samples, not bytes). Undersized buffers and empty
//! dimensions are caller bugs and panic at construction.

use std::ops::Range;

#[inline]
fn required_len(width: usize, height: usize, stride: usize) -> usize {
    (height - 1) * stride + width
}

/// Read-only view on a strided plane.
#[derive(Clone, Copy)]
pub struct PlaneRef<'a> {
    data: &'a [f32],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> PlaneRef<'a> {
    pub fn new(data: &'a [f32], width: usize, height: usize, stride: usize) -> Self {
        assert!(width > 0 && height > 0, "empty plane {}x{}", width, height);
        assert!(stride >= width, "stride {} < width {}", stride, width);
        assert!(
            data.len() >= required_len(width, height, stride),
            "plane buffer too small: {} < {}",
            data.len(),
            required_len(width, height, stride)
        );
        Self { data, width, height, stride }
    }

    /// Tightly packed plane (stride == width).
    pub fn packed(data: &'a [f32], width: usize, height: usize) -> Self {
        Self::new(data, width, height, width)
    }

    #[inline]
    pub fn width(&self) -> usize { self.width }

    #[inline]
    pub fn height(&self) -> usize { self.height }

    #[inline]
    pub fn stride(&self) -> usize { self.stride }

    /// The `width` samples of row `y`.
    #[inline]
    pub fn row(&self, y: usize) -> &'a [f32] {
        debug_assert!(y < self.height, "row {} out of {}", y, self.height);
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.row(y)[x]
    }
}

/// Writable view on a strided plane, or on a band of its rows.
///
/// Rows are always addressed with picture coordinates, so a band split off
/// for one worker keeps the row numbering of the whole plane.
pub struct PlaneMut<'a> {
    data: &'a mut [f32],
    width: usize,
    height: usize,
    stride: usize,
    y_base: usize,
}

impl<'a> PlaneMut<'a> {
    pub fn new(data: &'a mut [f32], width: usize, height: usize, stride: usize) -> Self {
        assert!(width > 0 && height > 0, "empty plane {}x{}", width, height);
        assert!(stride >= width, "stride {} < width {}", stride, width);
        assert!(
            data.len() >= required_len(width, height, stride),
            "plane buffer too small: {} < {}",
            data.len(),
            required_len(width, height, stride)
        );
        Self { data, width, height, stride, y_base: 0 }
    }

    pub fn packed(data: &'a mut [f32], width: usize, height: usize) -> Self {
        Self::new(data, width, height, width)
    }

    #[inline]
    pub fn width(&self) -> usize { self.width }

    /// Number of rows covered by this view.
    #[inline]
    pub fn height(&self) -> usize { self.height }

    #[inline]
    pub fn stride(&self) -> usize { self.stride }

    /// Picture rows covered by this view.
    #[inline]
    pub fn rows(&self) -> Range<usize> {
        self.y_base..self.y_base + self.height
    }

    /// Row `y` (picture coordinates).
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        debug_assert!(
            self.rows().contains(&y),
            "row {} outside band {:?}",
            y,
            self.rows()
        );
        let start = (y - self.y_base) * self.stride;
        &mut self.data[start..start + self.width]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        debug_assert!(self.rows().contains(&y));
        let start = (y - self.y_base) * self.stride;
        &self.data[start..start + self.width]
    }

    pub fn fill(&mut self, value: f32) {
        for y in self.rows() {
            self.row_mut(y).fill(value);
        }
    }

    /// Splits the view into disjoint row bands, one per range.
    ///
    /// Ranges must be non-empty, ascending and non-overlapping, and lie
    /// within the view.
    pub fn split_rows(&mut self, ranges: &[Range<usize>]) -> Vec<PlaneMut<'_>> {
        let width = self.width;
        let stride = self.stride;
        let end_row = self.y_base + self.height;

        let mut bands = Vec::with_capacity(ranges.len());
        let mut rest: &mut [f32] = &mut self.data[..];
        let mut cursor = self.y_base;

        for r in ranges {
            assert!(
                r.start >= cursor && r.start < r.end && r.end <= end_row,
                "invalid band {:?} (cursor {}, end {})",
                r,
                cursor,
                end_row
            );
            let tail = std::mem::take(&mut rest);
            let skip = ((r.start - cursor) * stride).min(tail.len());
            let (_, tail) = tail.split_at_mut(skip);
            let len = ((r.end - r.start) * stride).min(tail.len());
            let (band, tail) = tail.split_at_mut(len);
            rest = tail;
            cursor = r.end;

            bands.push(PlaneMut {
                data: band,
                width,
                height: r.end - r.start,
                stride,
                y_base: r.start,
            });
        }

        bands
    }
}
