use std::fmt;
use thiserror::Error;

/// Error reported by a device backend, kept as the source of a [`DotError`].
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = DotError> = std::result::Result<T, E>;

/// Direction of a copy between host and device memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HostToDevice,
    DeviceToHost,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::HostToDevice => write!(f, "host to device"),
            Direction::DeviceToHost => write!(f, "device to host"),
        }
    }
}

/// Failures of a dot product run. The first failing device call ends the run.
#[derive(Debug, Error)]
pub enum DotError {
    #[error("input lengths differ: a has {a} elements, b has {b}")]
    LengthMismatch { a: usize, b: usize },

    #[error("invalid launch configuration: {0}")]
    InvalidConfig(String),

    #[error("device unavailable: {reason}")]
    Unavailable {
        reason: String,
        #[source]
        source: Option<BackendError>,
    },

    #[error("failed to allocate {bytes} bytes of device memory")]
    Alloc {
        bytes: usize,
        #[source]
        source: Option<BackendError>,
    },

    #[error("{direction} copy of {bytes} bytes failed: {reason}")]
    Transfer {
        direction: Direction,
        bytes: usize,
        reason: String,
        #[source]
        source: Option<BackendError>,
    },

    #[error("launch of `{kernel}` with {grid_size} blocks of {block_size} threads failed: {reason}")]
    Launch {
        kernel: &'static str,
        grid_size: u32,
        block_size: u32,
        reason: String,
        #[source]
        source: Option<BackendError>,
    },
}

impl DotError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        DotError::Unavailable {
            reason: reason.into(),
            source: None,
        }
    }
}

/// Size in bytes of `len` `f32` values.
pub(crate) fn f32_bytes(len: usize) -> usize {
    len.saturating_mul(std::mem::size_of::<f32>())
}
