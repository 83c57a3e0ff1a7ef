//! Runs against the first CUDA device. Build with `--features cuda` and run
//! with `--ignored` on a machine with a GPU.
#![cfg(feature = "cuda")]

use dot_cuda::{dot_product, CudaDevice, DotConfig, Strategy};

const STRATEGIES: [Strategy; 2] = [Strategy::Atomic, Strategy::Tree];

fn config(strategy: Strategy) -> DotConfig {
    DotConfig {
        strategy,
        ..DotConfig::default()
    }
}

#[test]
#[ignore = "requires a CUDA device"]
fn default_problem_on_gpu() {
    let device = CudaDevice::new().unwrap();
    let a = vec![5.0f32; 1040];
    let b = vec![8.0f32; 1040];
    for strategy in STRATEGIES {
        assert_eq!(dot_product(&device, &a, &b, &config(strategy)).unwrap(), 41600.0);
    }
}

#[test]
#[ignore = "requires a CUDA device"]
fn block_boundaries_on_gpu() {
    let device = CudaDevice::new().unwrap();
    for strategy in STRATEGIES {
        for n in [1usize, 10, 256, 257] {
            let a = vec![-5.0f32; n];
            let b = vec![8.0f32; n];
            let result = dot_product(&device, &a, &b, &config(strategy)).unwrap();
            assert_eq!(result, n as f32 * -40.0, "n = {n}, {strategy:?}");
        }
    }
}

#[test]
#[ignore = "requires a CUDA device"]
fn repeated_calls_on_gpu_start_from_zero() {
    let device = CudaDevice::new().unwrap();
    let a = vec![5.0f32; 1040];
    let b = vec![8.0f32; 1040];
    for _ in 0..5 {
        let result = dot_product(&device, &a, &b, &DotConfig::default()).unwrap();
        assert_eq!(result, 41600.0);
    }
}

#[test]
#[ignore = "requires a CUDA device"]
fn capped_grid_on_gpu() {
    let device = CudaDevice::new().unwrap();
    let a = vec![5.0f32; 10_000];
    let b = vec![8.0f32; 10_000];
    let config = DotConfig {
        max_grid_size: Some(2),
        ..DotConfig::default()
    };
    assert_eq!(dot_product(&device, &a, &b, &config).unwrap(), 400_000.0);
}
