use crate::config::DotConfig;
use crate::device::{Device, HostDevice};
use crate::dot::dot_product;
use crate::error::{f32_bytes, DotError, Result};
use clap::ValueEnum;
use std::time::Instant;
use tracing::info;

/// Where the kernels run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// The CPU grid emulator.
    Host,
    /// The first CUDA device. Needs the `cuda` feature.
    Cuda,
}

impl Default for Backend {
    fn default() -> Self {
        if cfg!(feature = "cuda") {
            Backend::Cuda
        } else {
            Backend::Host
        }
    }
}

/// One run of the driver: two constant-filled vectors and a device.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    /// Length of both vectors.
    pub len: usize,
    /// Value of every element of `a`.
    pub a_value: f32,
    /// Value of every element of `b`.
    pub b_value: f32,
    pub backend: Backend,
    /// Worker threads of the host emulator. `None` uses rayon's global pool.
    pub host_threads: Option<usize>,
    pub dot: DotConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            len: 1040,
            a_value: 5.0,
            b_value: 8.0,
            backend: Backend::default(),
            host_threads: None,
            dot: DotConfig::default(),
        }
    }
}

/// Builds the input vectors and computes their dot product on the configured
/// backend.
pub fn run(config: &DriverConfig) -> Result<f32> {
    let a = filled(config.len, config.a_value)?;
    let b = filled(config.len, config.b_value)?;

    match config.backend {
        Backend::Host => {
            let device = match config.host_threads {
                Some(threads) => HostDevice::with_threads(threads)?,
                None => HostDevice::new(),
            };
            timed_dot_product(&device, &a, &b, &config.dot)
        }
        Backend::Cuda => run_cuda(&a, &b, &config.dot),
    }
}

/// A vector of `len` copies of `value`. Fails instead of aborting when the
/// host cannot hold it.
fn filled(len: usize, value: f32) -> Result<Vec<f32>> {
    let mut values = Vec::new();
    values
        .try_reserve_exact(len)
        .map_err(|err| DotError::Alloc {
            bytes: f32_bytes(len),
            source: Some(Box::new(err)),
        })?;
    values.resize(len, value);
    Ok(values)
}

#[cfg(feature = "cuda")]
fn run_cuda(a: &[f32], b: &[f32], config: &DotConfig) -> Result<f32> {
    let device = crate::device::CudaDevice::new()?;
    timed_dot_product(&device, a, b, config)
}

#[cfg(not(feature = "cuda"))]
fn run_cuda(_a: &[f32], _b: &[f32], _config: &DotConfig) -> Result<f32> {
    Err(DotError::unavailable(
        "built without the `cuda` feature",
    ))
}

fn timed_dot_product<D: Device>(
    device: &D,
    a: &[f32],
    b: &[f32],
    config: &DotConfig,
) -> Result<f32> {
    let now = Instant::now();
    let result = dot_product(device, a, b, config)?;
    info!(
        device = device.name(),
        elapsed = ?now.elapsed(),
        "dot product finished"
    );
    Ok(result)
}

/// The line printed for a result.
pub fn report(result: f32) -> String {
    format!("Producto punto: {}", general(result.into()))
}

/// Significant digits of [`general`], the C++ stream default.
const PRECISION: i32 = 6;

/// Formats `value` like C's `%g`: six significant digits, fixed notation
/// for exponents in `-4..6` and `d.ddddde+XX` otherwise, trailing zeros
/// removed.
fn general(value: f64) -> String {
    if value.is_nan() {
        return if value.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the target digits first; the exponent after rounding picks
    // the notation.
    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if (-4..PRECISION).contains(&exponent) {
        let fixed = format!("{:.*}", (PRECISION - 1 - exponent) as usize, value);
        strip_zeros(&fixed).to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", strip_zeros(mantissa), sign, exponent.abs())
    }
}

fn strip_zeros(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}
