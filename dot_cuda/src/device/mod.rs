//! Devices a dot product can run on.
//!
//! A [`Device`] offers the four operations the routine needs from a GPU
//! runtime: allocate, copy in either direction, and launch a kernel. Freeing
//! is the `Drop` of the backend's buffer type.

#[cfg(feature = "cuda")]
mod cuda;
mod host;

#[cfg(feature = "cuda")]
pub use cuda::CudaDevice;
pub use host::{HostBuffer, HostDevice};

use crate::error::Result;
use dot_gpu::LaunchDims;

/// A kernel of the `dot_gpu` module together with its buffer arguments.
#[derive(Debug)]
pub enum Kernel<'a, B> {
    /// Adds every `a[j] * b[j]` to `acc[0]` with an atomic add.
    DotAtomic { a: &'a B, b: &'a B, acc: &'a B },
    /// Writes one reduced partial per block to `partials[blockIdx.x]`.
    DotPartial { a: &'a B, b: &'a B, partials: &'a B },
}

impl<B> Kernel<'_, B> {
    pub fn name(&self) -> &'static str {
        match self {
            Kernel::DotAtomic { .. } => dot_gpu::DOT_ATOMIC,
            Kernel::DotPartial { .. } => dot_gpu::DOT_PARTIAL,
        }
    }
}

pub trait Device {
    /// An `f32` allocation in device memory, released on drop.
    type Buffer;

    fn name(&self) -> &'static str;

    /// Allocates `len` floats set to `0.0`.
    fn alloc_zeroed(&self, len: usize) -> Result<Self::Buffer>;

    /// Allocates a buffer of `host.len()` floats and copies `host` into it.
    fn upload(&self, host: &[f32]) -> Result<Self::Buffer>;

    /// Copies `buffer` into `host`. Waits for all previously launched work to
    /// finish, so the copy observes every write the kernels made.
    fn download(&self, buffer: &Self::Buffer, host: &mut [f32]) -> Result<()>;

    fn launch(&self, kernel: Kernel<'_, Self::Buffer>, dims: LaunchDims) -> Result<()>;
}
