use crate::config::{DotConfig, Strategy};
use crate::device::{Device, Kernel};
use crate::error::{DotError, Result};
use dot_gpu::LaunchDims;
use tracing::{debug, info_span};

/// Computes `a · b` on `device`.
///
/// Both inputs are copied to device memory, a grid shaped by `config` runs the
/// dot product kernel, and the result is copied back. All device memory is
/// released before returning, on success and on error. The accumulator is
/// allocated zeroed on every call, so repeated calls do not see each other's
/// sums.
///
/// Returns `0.0` for empty inputs without touching the device.
pub fn dot_product<D: Device>(
    device: &D,
    a: &[f32],
    b: &[f32],
    config: &DotConfig,
) -> Result<f32> {
    if a.len() != b.len() {
        return Err(DotError::LengthMismatch {
            a: a.len(),
            b: b.len(),
        });
    }
    let dims = config.launch_dims(a.len())?;
    if a.is_empty() {
        return Ok(0.0);
    }

    let span = info_span!(
        "dot_product",
        device = device.name(),
        len = a.len(),
        strategy = ?config.strategy
    );
    let _guard = span.enter();

    let result = run_kernel(device, a, b, dims, config.strategy)?;
    debug!(result, "released device buffers");
    Ok(result)
}

/// Runs one launch of the strategy's kernel. Device buffers live until this
/// returns.
fn run_kernel<D: Device>(
    device: &D,
    a: &[f32],
    b: &[f32],
    dims: LaunchDims,
    strategy: Strategy,
) -> Result<f32> {
    let dev_a = device.upload(a)?;
    let dev_b = device.upload(b)?;
    debug!(
        grid_size = dims.grid_size,
        block_size = dims.block_size,
        total_threads = dims.total_threads(),
        "copied inputs to device"
    );

    let result = match strategy {
        Strategy::Atomic => {
            let dev_acc = device.alloc_zeroed(1)?;
            device.launch(
                Kernel::DotAtomic {
                    a: &dev_a,
                    b: &dev_b,
                    acc: &dev_acc,
                },
                dims,
            )?;

            let mut acc = [0f32];
            device.download(&dev_acc, &mut acc)?;
            acc[0]
        }
        Strategy::Tree => {
            let dev_partials = device.alloc_zeroed(dims.grid_size as usize)?;
            device.launch(
                Kernel::DotPartial {
                    a: &dev_a,
                    b: &dev_b,
                    partials: &dev_partials,
                },
                dims,
            )?;

            // Finish the sum on the host.
            let mut partials = vec![0f32; dims.grid_size as usize];
            device.download(&dev_partials, &mut partials)?;
            partials.iter().sum()
        }
    };

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HostDevice;

    #[test]
    fn default_problem() {
        let a = vec![5.0f32; 1040];
        let b = vec![8.0f32; 1040];
        let result = dot_product(&HostDevice::new(), &a, &b, &DotConfig::default()).unwrap();
        assert_eq!(result, 41600.0);
    }

    #[test]
    fn mismatched_lengths_fail_before_any_launch() {
        let err = dot_product(
            &HostDevice::new(),
            &[1.0, 2.0],
            &[1.0],
            &DotConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DotError::LengthMismatch { a: 2, b: 1 }));
    }

    #[test]
    fn empty_inputs_sum_to_zero() {
        let result = dot_product(&HostDevice::new(), &[], &[], &DotConfig::default()).unwrap();
        assert_eq!(result, 0.0);
    }

    #[test]
    fn invalid_config_is_reported_for_empty_inputs_too() {
        let config = DotConfig {
            block_size: 0,
            ..DotConfig::default()
        };
        let err = dot_product(&HostDevice::new(), &[], &[], &config).unwrap_err();
        assert!(matches!(err, DotError::InvalidConfig(_)));
    }
}
