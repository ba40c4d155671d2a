//! Execution context and command queue creation.

use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::device::Device;

use crate::error::{Error, Result};

/// Creates a context bound to exactly one device.
pub fn create_context(device: &Device) -> Result<Context> {
    Context::from_device(device)
        .map_err(|e| Error::ContextCreation(format!("failed to create context: {:?}", e)))
}

/// Creates an in-order command queue for `device` within `context`.
///
/// Operations submitted to the queue execute and complete in submission
/// order; a blocking download therefore observes every previously
/// enqueued operation on the same queue.
pub fn create_queue(context: &Context, device: &Device) -> Result<CommandQueue> {
    // The OpenCL 1.2 entry point; macOS never moved past 1.2.
    #[allow(deprecated)]
    unsafe {
        CommandQueue::create(context, device.id(), 0)
            .map_err(|e| Error::QueueCreation(format!("failed to create queue: {:?}", e)))
    }
}
