//! Device buffer allocation and host transfers.
//!
//! Buffers are byte-length oriented; callers reinterpret typed host slices
//! with `bytemuck::cast_slice` at the boundary.

use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::memory::{
    Buffer as ClBuffer, CL_MEM_COPY_HOST_PTR, CL_MEM_READ_ONLY, CL_MEM_READ_WRITE,
    CL_MEM_WRITE_ONLY,
};
use opencl3::types::CL_BLOCKING;

use crate::error::{Error, Result};
use crate::ledger::{HandleKind, TrackedHandle};

/// Access mode for a device memory region, from the kernel's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    fn mem_flags(self) -> u64 {
        match self {
            AccessMode::ReadOnly => CL_MEM_READ_ONLY,
            AccessMode::WriteOnly => CL_MEM_WRITE_ONLY,
            AccessMode::ReadWrite => CL_MEM_READ_WRITE,
        }
    }
}

/// A device-resident memory region of fixed byte length.
pub struct DeviceBuffer {
    buffer: ClBuffer<u8>,
    byte_len: usize,
    mode: AccessMode,
}

impl DeviceBuffer {
    /// Allocates a buffer of `byte_len` bytes with unspecified contents.
    pub fn allocate(context: &Context, mode: AccessMode, byte_len: usize) -> Result<Self> {
        let buffer = unsafe {
            ClBuffer::create(context, mode.mem_flags(), byte_len, std::ptr::null_mut()).map_err(
                |e| Error::Allocation(format!("failed to create {} byte buffer: {:?}", byte_len, e)),
            )?
        };

        Ok(DeviceBuffer {
            buffer,
            byte_len,
            mode,
        })
    }

    /// Allocates a buffer populated from `data` at creation time.
    ///
    /// The copy is synchronous; `data` is not referenced after this call
    /// returns.
    pub fn with_host_data(context: &Context, mode: AccessMode, data: &[u8]) -> Result<Self> {
        let buffer = unsafe {
            ClBuffer::create(
                context,
                mode.mem_flags() | CL_MEM_COPY_HOST_PTR,
                data.len(),
                data.as_ptr() as *mut std::ffi::c_void,
            )
            .map_err(|e| {
                Error::Allocation(format!(
                    "failed to create {} byte buffer from host data: {:?}",
                    data.len(),
                    e
                ))
            })?
        };

        Ok(DeviceBuffer {
            buffer,
            byte_len: data.len(),
            mode,
        })
    }

    /// Returns the buffer length in bytes.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Returns the access mode the buffer was created with.
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Returns the underlying OpenCL buffer.
    pub fn cl_buffer(&self) -> &ClBuffer<u8> {
        &self.buffer
    }

    /// Copies `data` from host memory into the buffer, blocking until the
    /// copy completes.
    pub fn upload(&mut self, queue: &CommandQueue, data: &[u8]) -> Result<()> {
        if data.len() != self.byte_len {
            return Err(Error::Transfer(format!(
                "upload length mismatch: host array is {} bytes, buffer is {} bytes",
                data.len(),
                self.byte_len
            )));
        }

        unsafe {
            queue
                .enqueue_write_buffer(&mut self.buffer, CL_BLOCKING, 0, data, &[])
                .map_err(|e| Error::Transfer(format!("write to device failed: {:?}", e)))?;
        }
        Ok(())
    }

    /// Copies the buffer contents back into `out`, blocking until the copy
    /// completes.
    ///
    /// The length check runs before anything is enqueued, so on mismatch
    /// `out` is left untouched. A blocking read on an in-order queue
    /// observes every operation previously submitted to the same queue.
    pub fn download(&self, queue: &CommandQueue, out: &mut [u8]) -> Result<()> {
        if out.len() != self.byte_len {
            return Err(Error::Transfer(format!(
                "download length mismatch: host array is {} bytes, buffer is {} bytes",
                out.len(),
                self.byte_len
            )));
        }

        unsafe {
            queue
                .enqueue_read_buffer(&self.buffer, CL_BLOCKING, 0, out, &[])
                .map_err(|e| Error::Transfer(format!("read from device failed: {:?}", e)))?;
        }
        Ok(())
    }
}

impl TrackedHandle for DeviceBuffer {
    const KIND: HandleKind = HandleKind::Buffer;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_mode_flags() {
        assert_eq!(AccessMode::ReadOnly.mem_flags(), CL_MEM_READ_ONLY);
        assert_eq!(AccessMode::WriteOnly.mem_flags(), CL_MEM_WRITE_ONLY);
        assert_eq!(AccessMode::ReadWrite.mem_flags(), CL_MEM_READ_WRITE);
    }
}
