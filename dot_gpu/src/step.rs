/// Indices visited by one thread of a grid-stride loop.
#[derive(Debug, Clone)]
pub struct GridStride {
    next: usize,
    stride: usize,
    end: usize,
}

impl Iterator for GridStride {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let next = self.next;
        // Saturate so a stride near `usize::MAX` ends the loop instead of wrapping.
        self.next = self.next.saturating_add(self.stride);
        Some(next)
    }
}

/// Returns an iterator over `start, start + stride, start + 2 * stride, ...`
/// that stops before `end`.
///
/// `start` is the thread's global index and `stride` is the total number of
/// threads in the grid, so every index in `0..end` is visited by exactly one
/// thread. A zero stride would never advance and is treated as one.
pub fn grid_stride(start: usize, stride: usize, end: usize) -> GridStride {
    GridStride {
        next: start,
        stride: stride.max(1),
        end,
    }
}
