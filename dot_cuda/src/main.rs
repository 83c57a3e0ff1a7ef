use clap::Parser;
use dot_cuda::driver::{self, Backend, DriverConfig};
use dot_cuda::{telemetry, DotConfig, Strategy, THREADS_PER_BLOCK};
use std::error::Error;

/// Dot product of two constant-filled vectors on a grid of GPU threads.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Length of both vectors.
    #[arg(short = 'n', long, default_value_t = 1040)]
    len: usize,

    /// Value of every element of the first vector.
    #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
    a_value: f32,

    /// Value of every element of the second vector.
    #[arg(long, default_value_t = 8.0, allow_negative_numbers = true)]
    b_value: f32,

    /// Threads per block.
    #[arg(short, long, default_value_t = THREADS_PER_BLOCK)]
    block_size: u32,

    /// Upper bound on blocks per grid.
    #[arg(long)]
    max_grid_size: Option<u32>,

    /// How thread results are combined.
    #[arg(short, long, value_enum, default_value_t = Strategy::Atomic)]
    strategy: Strategy,

    /// Where the kernels run.
    #[arg(long, value_enum, default_value_t = Backend::default())]
    backend: Backend,

    /// Worker threads of the host emulator.
    #[arg(long)]
    host_threads: Option<usize>,
}

impl From<Args> for DriverConfig {
    fn from(args: Args) -> Self {
        Self {
            len: args.len,
            a_value: args.a_value,
            b_value: args.b_value,
            backend: args.backend,
            host_threads: args.host_threads,
            dot: DotConfig {
                block_size: args.block_size,
                max_grid_size: args.max_grid_size,
                strategy: args.strategy,
            },
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    telemetry::init_tracing("warn")?;

    let result = driver::run(&args.into())?;
    println!("{}", driver::report(result));

    Ok(())
}
