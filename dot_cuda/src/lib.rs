//! Dot product of two `f32` vectors on a grid of GPU threads.
//!
//! The kernels live in the `dot_gpu` crate. This crate moves the inputs to a
//! [`Device`], launches a kernel over a one-dimensional grid and copies the
//! scalar result back. Two devices are available: [`HostDevice`] emulates
//! the grid on the CPU, and `CudaDevice` (feature `cuda`) runs the kernels on
//! the first CUDA device.

mod config;
pub mod device;
mod dot;
pub mod driver;
mod error;
pub mod telemetry;

pub use config::{DotConfig, Strategy};
#[cfg(feature = "cuda")]
pub use device::CudaDevice;
pub use device::{Device, HostDevice, Kernel};
pub use dot::dot_product;
pub use error::{BackendError, Direction, DotError, Result};
pub use dot_gpu::{LaunchDims, THREADS_PER_BLOCK};
