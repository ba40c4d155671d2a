//! clsmoke: minimal OpenCL dispatch harness with host-side verification.
//!
//! Offloads a numeric computation to one OpenCL device and checks the
//! result against a reference computed on the host. The interesting part
//! is the dispatch pipeline itself:
//!
//! - **locator**: platform/device enumeration and index selection
//! - **context**: context and in-order command queue creation
//! - **buffer**: device buffer allocation and blocking host transfers
//! - **program**: kernel compilation with verbatim build diagnostics
//! - **dispatch**: positional argument binding and N-dimensional launch
//! - **ledger**: handle tracking with reverse-order release on every
//!   exit path
//! - **pipeline**: the whole flow wired together
//!
//! Exactly one device, one in-order queue, and one synchronous dispatch;
//! the host blocks only at the final download.

pub mod buffer;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod locator;
pub mod pipeline;
pub mod program;
pub mod reference;

pub use buffer::{AccessMode, DeviceBuffer};
pub use dispatch::{ArgTable, Dispatcher, KernelArg, WorkSpec};
pub use error::{Error, Result};
pub use ledger::{HandleId, HandleKind, ResourceLedger, Tracked, TrackedHandle};
pub use locator::DeviceTypeFilter;
pub use pipeline::{run, run_with_ledger, PipelineConfig};
