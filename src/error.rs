//! Error taxonomy for the dispatch pipeline.
//!
//! Every `opencl3` status code is converted into one of these variants at
//! the call site that observed it; raw driver codes never reach callers.

/// Errors that can occur while driving the compute pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Platform/device enumeration failed, or a selection index was out of
    /// range.
    #[error("enumeration failed: {0}")]
    Enumeration(String),

    /// The driver rejected context creation for the selected device.
    #[error("context creation failed: {0}")]
    ContextCreation(String),

    /// The driver rejected command queue creation.
    #[error("queue creation failed: {0}")]
    QueueCreation(String),

    /// A device buffer could not be allocated.
    #[error("buffer allocation failed: {0}")]
    Allocation(String),

    /// Kernel source failed to compile. The compiler diagnostic text is
    /// carried verbatim; kernel source bugs are otherwise silent.
    #[error("kernel build failed:\n{log}")]
    Build { log: String },

    /// The built program has no entry point with the requested name.
    #[error("kernel entry point '{name}' not found: {detail}")]
    EntryPointNotFound { name: String, detail: String },

    /// Kernel dispatch was rejected, either by argument validation on the
    /// host or by the device at launch.
    #[error("dispatch failed: {0}")]
    Dispatch(String),

    /// A host/device copy failed or the host array length did not match
    /// the buffer length.
    #[error("transfer failed: {0}")]
    Transfer(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Process exit code for this failure category, one per variant.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Enumeration(_) => 2,
            Error::ContextCreation(_) => 3,
            Error::QueueCreation(_) => 4,
            Error::Allocation(_) => 5,
            Error::Build { .. } => 6,
            Error::EntryPointNotFound { .. } => 7,
            Error::Dispatch(_) => 8,
            Error::Transfer(_) => 9,
        }
    }
}
