use crate::launch::MAX_THREADS_PER_BLOCK;
use crate::reduce::{atomic_thread_dot, thread_sum, tree_step, tree_strides};
use cuda_std::atomic::AtomicF32;
use cuda_std::{kernel, shared_array, thread};

/// Accumulates `a · b` into `acc[0]`.
///
/// Every product is added to the single shared accumulator with an atomic
/// add. A plain `*acc += ...` here loses updates between threads and
/// produces a wrong total. `acc` must be zeroed before the launch.
#[kernel]
#[allow(improper_ctypes_definitions, clippy::missing_safety_doc)]
pub unsafe fn dot_atomic(a: &[f32], b: &[f32], acc: *mut f32) {
    let id = (thread::thread_idx_x() + thread::block_idx_x() * thread::block_dim_x()) as usize;
    let total_threads = (thread::block_dim_x() * thread::grid_dim_x()) as usize;

    // AtomicF32 has the memory layout of f32.
    let acc = &*(acc as *const AtomicF32);
    atomic_thread_dot(a, b, id, total_threads, acc);
}

/// Writes the part of `a · b` owned by each block to `partials[blockIdx.x]`.
///
/// Each thread sums its own products, then the block combines the per-thread
/// sums with a tree reduction in shared memory. The block size must be a
/// power of 2 no larger than `MAX_THREADS_PER_BLOCK`.
#[kernel]
#[allow(improper_ctypes_definitions, clippy::missing_safety_doc)]
pub unsafe fn dot_partial(a: &[f32], b: &[f32], partials: *mut f32) {
    let cache = shared_array![f32; MAX_THREADS_PER_BLOCK as usize];
    let id = (thread::thread_idx_x() + thread::block_idx_x() * thread::block_dim_x()) as usize;
    let total_threads = (thread::block_dim_x() * thread::grid_dim_x()) as usize;
    let cache_index = thread::thread_idx_x() as usize;

    *cache.add(cache_index) = thread_sum(a, b, id, total_threads);

    thread::sync_threads();

    for stride in tree_strides(thread::block_dim_x() as usize) {
        tree_step(cache, cache_index, stride);
        thread::sync_threads();
    }

    if cache_index == 0 {
        *partials.add(thread::block_idx_x() as usize) = *cache.add(0);
    }
}
