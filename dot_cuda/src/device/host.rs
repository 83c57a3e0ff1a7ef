use super::{Device, Kernel};
use crate::error::{f32_bytes, Direction, DotError, Result};
use dot_gpu::reduce::{atomic_thread_dot, thread_sum, tree_reduce};
use dot_gpu::{AtomicF32, LaunchDims, MAX_GRID_SIZE, MAX_THREADS_PER_BLOCK};
use itertools::Itertools;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use std::sync::atomic::Ordering;
use tracing::{debug, trace};

/// Emulates a CUDA device on the CPU.
///
/// A launch runs every thread of the grid. Blocks are spread over a rayon
/// pool and the threads of one block run one after another, so threads of
/// different blocks race on shared memory exactly like device threads do.
/// Each emulated thread calls the same per-thread bodies from
/// `dot_gpu::reduce` as the device kernels, and atomic adds go through the
/// same `AtomicF32` the device uses.
pub struct HostDevice {
    pool: Option<ThreadPool>,
}

/// Device memory of a [`HostDevice`].
pub struct HostBuffer {
    cells: Box<[AtomicF32]>,
}

impl fmt::Debug for HostBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBuffer").field("len", &self.len()).finish()
    }
}

impl HostBuffer {
    fn zeroed(len: usize) -> Result<Self> {
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|err| DotError::Alloc {
                bytes: f32_bytes(len),
                source: Some(Box::new(err)),
            })?;
        cells.extend((0..len).map(|_| AtomicF32::new(0.0)));
        Ok(Self {
            cells: cells.into_boxed_slice(),
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn cell(&self, i: usize) -> &AtomicF32 {
        &self.cells[i]
    }

    fn load(&self, i: usize) -> f32 {
        self.cells[i].load(Ordering::Acquire)
    }

    fn store(&self, i: usize, value: f32) {
        self.cells[i].store(value, Ordering::Release);
    }

    /// The buffer contents as read by a kernel that only loads from it.
    fn snapshot(&self) -> Vec<f32> {
        (0..self.len()).map(|i| self.load(i)).collect_vec()
    }
}

impl HostDevice {
    /// Runs launches on rayon's global pool.
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Runs launches on a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("dot-block-{i}"))
            .build()
            .map_err(|err| DotError::Unavailable {
                reason: format!("cannot start {threads} host worker threads"),
                source: Some(Box::new(err)),
            })?;
        Ok(Self { pool: Some(pool) })
    }

    fn check_dims(kernel: &'static str, dims: LaunchDims) -> Result<()> {
        let reason = if dims.block_size == 0 || dims.block_size > MAX_THREADS_PER_BLOCK {
            format!("block size must be in 1..={MAX_THREADS_PER_BLOCK}")
        } else if dims.grid_size == 0 || dims.grid_size > MAX_GRID_SIZE {
            format!("grid size must be in 1..={MAX_GRID_SIZE}")
        } else {
            return Ok(());
        };
        Err(DotError::Launch {
            kernel,
            grid_size: dims.grid_size,
            block_size: dims.block_size,
            reason,
            source: None,
        })
    }

    fn run_blocks<F>(&self, dims: LaunchDims, block: F)
    where
        F: Fn(u32) + Send + Sync,
    {
        let run = || (0..dims.grid_size).into_par_iter().for_each(&block);
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for HostDevice {
    type Buffer = HostBuffer;

    fn name(&self) -> &'static str {
        "host"
    }

    fn alloc_zeroed(&self, len: usize) -> Result<HostBuffer> {
        trace!(len, "host alloc");
        HostBuffer::zeroed(len)
    }

    fn upload(&self, host: &[f32]) -> Result<HostBuffer> {
        let buffer = HostBuffer::zeroed(host.len())?;
        for (i, &value) in host.iter().enumerate() {
            buffer.store(i, value);
        }
        trace!(len = host.len(), "host upload");
        Ok(buffer)
    }

    fn download(&self, buffer: &HostBuffer, host: &mut [f32]) -> Result<()> {
        if buffer.len() != host.len() {
            return Err(DotError::Transfer {
                direction: Direction::DeviceToHost,
                bytes: f32_bytes(host.len()),
                reason: format!(
                    "buffer holds {} elements, host slice {}",
                    buffer.len(),
                    host.len()
                ),
                source: None,
            });
        }
        // Launches join all their blocks before returning, so there is nothing
        // left to wait for here.
        for (i, slot) in host.iter_mut().enumerate() {
            *slot = buffer.load(i);
        }
        trace!(len = host.len(), "host download");
        Ok(())
    }

    fn launch(&self, kernel: Kernel<'_, HostBuffer>, dims: LaunchDims) -> Result<()> {
        let name = kernel.name();
        Self::check_dims(name, dims)?;
        debug!(
            kernel = name,
            grid_size = dims.grid_size,
            block_size = dims.block_size,
            "host launch"
        );
        let total_threads = dims.total_threads();

        match kernel {
            Kernel::DotAtomic { a, b, acc } => {
                if acc.is_empty() {
                    return Err(out_of_bounds(name, dims, "accumulator is empty"));
                }
                let (a, b) = (a.snapshot(), b.snapshot());
                let acc = acc.cell(0);
                self.run_blocks(dims, |block_idx| {
                    for thread_idx in 0..dims.block_size {
                        let id = dims.global_index(block_idx, thread_idx);
                        atomic_thread_dot(&a, &b, id, total_threads, acc);
                    }
                });
            }
            Kernel::DotPartial { a, b, partials } => {
                if partials.len() < dims.grid_size as usize {
                    return Err(out_of_bounds(
                        name,
                        dims,
                        "partials buffer is smaller than the grid",
                    ));
                }
                let (a, b) = (a.snapshot(), b.snapshot());
                self.run_blocks(dims, |block_idx| {
                    let mut cache = (0..dims.block_size)
                        .map(|thread_idx| {
                            let id = dims.global_index(block_idx, thread_idx);
                            thread_sum(&a, &b, id, total_threads)
                        })
                        .collect_vec();
                    partials.store(block_idx as usize, tree_reduce(&mut cache));
                });
            }
        }
        Ok(())
    }
}

fn out_of_bounds(kernel: &'static str, dims: LaunchDims, reason: &str) -> DotError {
    DotError::Launch {
        kernel,
        grid_size: dims.grid_size,
        block_size: dims.block_size,
        reason: reason.to_string(),
        source: None,
    }
}
