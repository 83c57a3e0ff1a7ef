use super::{Device, Kernel};
use crate::error::{f32_bytes, Direction, DotError, Result};
use cust::context::Context;
use cust::error::CudaError;
use cust::prelude::*;
use dot_gpu::LaunchDims;
use tracing::{debug, trace};

static PTX: &str = include_str!(concat!(env!("OUT_DIR"), "/dot_gpu.ptx"));

/// The first CUDA device, running the `dot_gpu` PTX module on one stream.
pub struct CudaDevice {
    // Field order matters: the module and stream must drop before the context.
    module: Module,
    stream: Stream,
    _ctx: Context,
}

impl CudaDevice {
    pub fn new() -> Result<Self> {
        let ctx =
            cust::quick_init().map_err(|err| unavailable("cannot create a CUDA context", err))?;
        let module = Module::from_ptx(PTX, &[])
            .map_err(|err| unavailable("cannot load the PTX module", err))?;
        let stream = Stream::new(StreamFlags::NON_BLOCKING, None)
            .map_err(|err| unavailable("cannot create a stream", err))?;
        debug!("initialised CUDA device");
        Ok(Self {
            module,
            stream,
            _ctx: ctx,
        })
    }
}

impl Device for CudaDevice {
    type Buffer = DeviceBuffer<f32>;

    fn name(&self) -> &'static str {
        "cuda"
    }

    fn alloc_zeroed(&self, len: usize) -> Result<DeviceBuffer<f32>> {
        trace!(len, "cuda alloc");
        DeviceBuffer::zeroed(len).map_err(|err| DotError::Alloc {
            bytes: f32_bytes(len),
            source: Some(Box::new(err)),
        })
    }

    fn upload(&self, host: &[f32]) -> Result<DeviceBuffer<f32>> {
        trace!(len = host.len(), "cuda upload");
        let mut buffer = unsafe { DeviceBuffer::uninitialized(host.len()) }.map_err(|err| {
            DotError::Alloc {
                bytes: f32_bytes(host.len()),
                source: Some(Box::new(err)),
            }
        })?;
        buffer.copy_from(host).map_err(|err| DotError::Transfer {
            direction: Direction::HostToDevice,
            bytes: f32_bytes(host.len()),
            reason: "cuMemcpyHtoD failed".into(),
            source: Some(Box::new(err)),
        })?;
        Ok(buffer)
    }

    fn download(&self, buffer: &DeviceBuffer<f32>, host: &mut [f32]) -> Result<()> {
        let bytes = f32_bytes(host.len());
        let transfer_error = move |reason: &str, err: CudaError| DotError::Transfer {
            direction: Direction::DeviceToHost,
            bytes,
            reason: reason.to_string(),
            source: Some(Box::new(err)),
        };
        if buffer.len() != host.len() {
            return Err(transfer_error(
                &format!("buffer holds {} elements, host slice {}", buffer.len(), host.len()),
                CudaError::InvalidValue,
            ));
        }
        self.stream
            .synchronize()
            .map_err(|err| transfer_error("waiting for the stream failed", err))?;
        buffer
            .copy_to(host)
            .map_err(|err| transfer_error("cuMemcpyDtoH failed", err))?;
        trace!(len = host.len(), "cuda download");
        Ok(())
    }

    fn launch(&self, kernel: Kernel<'_, DeviceBuffer<f32>>, dims: LaunchDims) -> Result<()> {
        let name = kernel.name();
        let launch_error = |reason: &str, err: CudaError| DotError::Launch {
            kernel: name,
            grid_size: dims.grid_size,
            block_size: dims.block_size,
            reason: reason.to_string(),
            source: Some(Box::new(err)),
        };
        let function = self
            .module
            .get_function(name)
            .map_err(|err| launch_error("kernel not found in module", err))?;
        let stream = &self.stream;
        debug!(
            kernel = name,
            grid_size = dims.grid_size,
            block_size = dims.block_size,
            "cuda launch"
        );

        let (a, b, out) = match kernel {
            Kernel::DotAtomic { a, b, acc } => (a, b, acc),
            Kernel::DotPartial { a, b, partials } => (a, b, partials),
        };
        let launched = unsafe {
            launch!(
                // slices are passed as two parameters, the pointer and the length.
                function<<<dims.grid_size, dims.block_size, 0, stream>>>(
                    a.as_device_ptr(),
                    a.len(),
                    b.as_device_ptr(),
                    b.len(),
                    out.as_device_ptr()
                )
            )
        };
        launched.map_err(|err| launch_error("launch rejected", err))?;
        stream
            .synchronize()
            .map_err(|err| launch_error("kernel failed while running", err))?;
        Ok(())
    }
}

fn unavailable(reason: &str, err: CudaError) -> DotError {
    DotError::Unavailable {
        reason: reason.to_string(),
        source: Some(Box::new(err)),
    }
}
