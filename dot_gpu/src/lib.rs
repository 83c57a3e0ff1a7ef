#![cfg_attr(
    target_os = "cuda",
    no_std,
    feature(register_attr),
    register_attr(nvvm_internal)
)]

pub mod kernels;
pub mod launch;
pub mod reduce;
mod step;

pub use cuda_std::atomic::AtomicF32;
pub use launch::{LaunchDims, MAX_GRID_SIZE, MAX_THREADS_PER_BLOCK, THREADS_PER_BLOCK};
pub use step::grid_stride;

/// Symbol names of the kernels in the compiled PTX module.
pub const DOT_ATOMIC: &str = "dot_atomic";
pub const DOT_PARTIAL: &str = "dot_partial";
