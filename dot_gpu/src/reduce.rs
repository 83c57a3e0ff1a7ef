//! Per-thread kernel bodies. The device kernels and the host emulator both
//! call these, one call per thread.

use crate::step::grid_stride;
use core::sync::atomic::Ordering;
use cuda_std::atomic::AtomicF32;

/// Products `a[j] * b[j]` owned by the thread with global index `id` in a
/// grid of `total_threads` threads.
///
/// Only the common prefix of `a` and `b` is visited.
pub fn thread_products<'a>(
    a: &'a [f32],
    b: &'a [f32],
    id: usize,
    total_threads: usize,
) -> impl Iterator<Item = f32> + 'a {
    let len = a.len().min(b.len());
    grid_stride(id, total_threads, len).map(move |j| a[j] * b[j])
}

/// One thread of `dot_atomic`: adds each of its products to `acc`.
///
/// `fetch_add` is the hardware `atom.add.f32` on the device and a CAS loop on
/// the CPU, so no update is lost. The order of the additions is unspecified.
pub fn atomic_thread_dot(
    a: &[f32],
    b: &[f32],
    id: usize,
    total_threads: usize,
    acc: &AtomicF32,
) {
    for product in thread_products(a, b, id, total_threads) {
        acc.fetch_add(product, Ordering::Relaxed);
    }
}

/// One thread of `dot_partial` before the block reduction: the sum of its own
/// products.
pub fn thread_sum(a: &[f32], b: &[f32], id: usize, total_threads: usize) -> f32 {
    let mut temp = 0.0f32;
    for product in thread_products(a, b, id, total_threads) {
        temp += product;
    }
    temp
}

/// Strides of a halving tree reduction over a block of `block_dim` threads:
/// `block_dim / 2, block_dim / 4, ..., 1`.
///
/// For reductions `block_dim` must be a power of 2, otherwise the odd element
/// at each level is dropped.
pub fn tree_strides(block_dim: usize) -> impl Iterator<Item = usize> {
    core::iter::successors(Some(block_dim / 2), |&s| Some(s / 2)).take_while(|&s| s > 0)
}

/// One thread's step at one level of the block tree reduction: slot
/// `cache_index < stride` absorbs slot `cache_index + stride`.
///
/// # Safety
///
/// `cache` must hold at least `2 * stride` floats, and no other thread may
/// touch slots `cache_index` or `cache_index + stride` during the step.
pub unsafe fn tree_step(cache: *mut f32, cache_index: usize, stride: usize) {
    if cache_index < stride {
        *cache.add(cache_index) += *cache.add(cache_index + stride);
    }
}

/// Runs the block tree reduction with the threads of the block taking turns
/// between levels instead of meeting at a barrier.
///
/// Returns the block total left in `cache[0]`.
pub fn tree_reduce(cache: &mut [f32]) -> f32 {
    if cache.is_empty() {
        return 0.0;
    }
    let block_dim = cache.len();
    let ptr = cache.as_mut_ptr();
    for stride in tree_strides(block_dim) {
        for cache_index in 0..block_dim {
            // SAFETY: stride <= block_dim / 2, and the threads run one at a time.
            unsafe { tree_step(ptr, cache_index, stride) };
        }
    }
    cache[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn thread_products_cover_the_common_prefix() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [10.0, 10.0, 10.0, 10.0];
        let total: f32 = (0..3).map(|id| thread_sum(&a, &b, id, 3)).sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn atomic_threads_lose_no_updates() {
        let a = vec![1.0f32; 8000];
        let b = vec![1.0f32; 8000];
        let acc = Arc::new(AtomicF32::new(0.0));
        let handles: Vec<_> = (0..8)
            .map(|id| {
                let (a, b, acc) = (a.clone(), b.clone(), Arc::clone(&acc));
                thread::spawn(move || atomic_thread_dot(&a, &b, id, 8, &acc))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(acc.load(Ordering::Relaxed), 8000.0);
    }

    #[test]
    fn idle_thread_leaves_accumulator_untouched() {
        let acc = AtomicF32::new(0.0);
        atomic_thread_dot(&[5.0; 1040], &[8.0; 1040], 1040, 1280, &acc);
        assert_eq!(acc.load(Ordering::Relaxed), 0.0);
    }

    #[test]
    fn tree_reduce_sums_power_of_two_block() {
        let mut cache: Vec<f32> = (1..=256).map(|i| i as f32).collect();
        assert_eq!(tree_reduce(&mut cache), 32896.0);
    }

    #[test]
    fn tree_reduce_single_and_empty() {
        assert_eq!(tree_reduce(&mut [7.0]), 7.0);
        assert_eq!(tree_reduce(&mut []), 0.0);
    }

    #[test]
    fn tree_step_only_moves_lower_half() {
        let mut cache = [1.0f32, 2.0, 3.0, 4.0];
        unsafe {
            tree_step(cache.as_mut_ptr(), 0, 2);
            tree_step(cache.as_mut_ptr(), 3, 2);
        }
        assert_eq!(cache, [4.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn tree_strides_for_default_block() {
        let strides: Vec<usize> = tree_strides(256).collect();
        assert_eq!(strides, vec![128, 64, 32, 16, 8, 4, 2, 1]);
    }
}
