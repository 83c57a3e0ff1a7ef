/// Default number of threads per block.
pub const THREADS_PER_BLOCK: u32 = 256;

/// Largest block the device accepts, and the size of the shared reduction cache.
pub const MAX_THREADS_PER_BLOCK: u32 = 1024;

/// Largest `gridDim.x` the device accepts.
pub const MAX_GRID_SIZE: u32 = i32::MAX as u32;

/// Shape of a one-dimensional kernel launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchDims {
    pub grid_size: u32,
    pub block_size: u32,
}

impl LaunchDims {
    /// Returns the smallest grid of `block_size` blocks with at least one
    /// thread per element, or `None` if that grid is larger than
    /// `MAX_GRID_SIZE`.
    ///
    /// With 1040 elements and 256 threads per block this is 5 blocks, so
    /// 1280 threads are launched and 240 of them have nothing to do.
    pub fn covering(len: usize, block_size: u32) -> Option<Self> {
        if block_size == 0 {
            return None;
        }
        let grid_size = div_ceil(len, block_size as usize);
        if grid_size > MAX_GRID_SIZE as usize {
            return None;
        }
        Some(Self {
            grid_size: grid_size as u32,
            block_size,
        })
    }

    /// Caps the number of blocks. Threads of a capped grid loop over the
    /// remaining elements.
    pub fn with_max_grid_size(self, max_grid_size: u32) -> Self {
        Self {
            grid_size: self.grid_size.min(max_grid_size),
            ..self
        }
    }

    /// `blockDim.x * gridDim.x`, the stride of the grid-stride loop.
    pub fn total_threads(&self) -> usize {
        self.grid_size as usize * self.block_size as usize
    }

    /// `blockDim.x * blockIdx.x + threadIdx.x`.
    pub fn global_index(&self, block_idx: u32, thread_idx: u32) -> usize {
        self.block_size as usize * block_idx as usize + thread_idx as usize
    }
}

pub fn div_ceil(numerator: usize, denominator: usize) -> usize {
    (numerator + denominator - 1) / denominator
}
