//! Kernel argument binding and work dispatch.
//!
//! Argument slots are zero-indexed and may be bound in any order, but
//! every slot from 0 through N-1 must be bound before dispatch. Validation
//! happens immediately before each enqueue: kernel objects keep stale
//! bindings across dispatches, so nothing is assumed from a prior launch.

use opencl3::command_queue::CommandQueue;
use opencl3::event::Event;
use opencl3::kernel::{ExecuteKernel, Kernel};
use opencl3::types::{cl_float, cl_int, cl_uint};

use crate::buffer::DeviceBuffer;
use crate::error::{Error, Result};

/// Dimensionality and extent of the dispatched index space.
///
/// Global sizes are per-dimension element counts; a zero in any dimension
/// means zero work items, which dispatches nothing and is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkSpec {
    global: Vec<usize>,
    local: Option<Vec<usize>>,
}

impl WorkSpec {
    /// Creates a work spec over `global`, which must have 1 to 3
    /// dimensions.
    pub fn new(global: &[usize]) -> Result<Self> {
        let dims = global.len();
        if dims == 0 || dims > 3 {
            return Err(Error::Dispatch(format!(
                "work spec must have 1 to 3 dimensions, got {}",
                dims
            )));
        }

        Ok(WorkSpec {
            global: global.to_vec(),
            local: None,
        })
    }

    /// Sets explicit per-dimension work-group sizes.
    ///
    /// Dimensionality must match the global sizes; whether each local size
    /// evenly divides its global size is enforced by the device at launch.
    pub fn with_local(mut self, local: &[usize]) -> Result<Self> {
        if local.len() != self.global.len() {
            return Err(Error::Dispatch(format!(
                "local work size has {} dimensions, global has {}",
                local.len(),
                self.global.len()
            )));
        }
        if local.contains(&0) {
            return Err(Error::Dispatch("local work size must be non-zero".into()));
        }

        self.local = Some(local.to_vec());
        Ok(self)
    }

    pub fn global(&self) -> &[usize] {
        &self.global
    }

    pub fn local(&self) -> Option<&[usize]> {
        self.local.as_deref()
    }

    /// True when any dimension is zero, i.e. the index space is empty.
    pub fn is_empty(&self) -> bool {
        self.global.iter().any(|&g| g == 0)
    }

    /// Total number of work items in the index space.
    pub fn work_items(&self) -> usize {
        self.global.iter().product()
    }
}

/// A value bound to one positional kernel argument slot.
pub enum KernelArg<'a> {
    /// A device buffer, passed by handle.
    Buffer(&'a DeviceBuffer),
    Uint(cl_uint),
    Int(cl_int),
    Float(cl_float),
}

/// Positional argument bindings, independent of any kernel object.
#[derive(Default)]
pub struct ArgTable<'a> {
    slots: Vec<Option<KernelArg<'a>>>,
}

impl<'a> ArgTable<'a> {
    pub fn new() -> Self {
        ArgTable { slots: Vec::new() }
    }

    /// Binds `arg` to slot `index`, growing the table as needed.
    /// Rebinding an occupied slot overwrites it.
    pub fn bind(&mut self, index: usize, arg: KernelArg<'a>) {
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index] = Some(arg);
    }

    /// Number of slots the table covers, bound or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Indices below `len()` that were never bound.
    pub fn missing(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    fn iter(&self) -> impl Iterator<Item = &KernelArg<'a>> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }
}

/// Binds arguments to a kernel and submits N-dimensional dispatches.
pub struct Dispatcher<'a> {
    kernel: &'a Kernel,
    args: ArgTable<'a>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(kernel: &'a Kernel) -> Self {
        Dispatcher {
            kernel,
            args: ArgTable::new(),
        }
    }

    /// Binds `arg` to positional slot `index`.
    pub fn bind(&mut self, index: usize, arg: KernelArg<'a>) -> &mut Self {
        self.args.bind(index, arg);
        self
    }

    /// Submits the kernel over the index space in `spec`.
    ///
    /// Fails with [`Error::Dispatch`] if any argument slot is unbound or
    /// the bound count does not match the kernel's declared argument
    /// count. An empty index space dispatches nothing and returns
    /// `Ok(None)`; otherwise the submission event is returned. The
    /// enqueue itself is non-blocking; completion is observed through a
    /// subsequent blocking download on the same in-order queue.
    pub fn dispatch(&self, queue: &CommandQueue, spec: &WorkSpec) -> Result<Option<Event>> {
        let missing = self.args.missing();
        if !missing.is_empty() {
            return Err(Error::Dispatch(format!(
                "unbound kernel argument slots: {:?}",
                missing
            )));
        }

        let expected = self
            .kernel
            .num_args()
            .map_err(|e| Error::Dispatch(format!("failed to query argument count: {:?}", e)))?
            as usize;
        if self.args.len() != expected {
            return Err(Error::Dispatch(format!(
                "kernel takes {} arguments, {} bound",
                expected,
                self.args.len()
            )));
        }

        if spec.is_empty() {
            log::debug!("empty index space {:?}, nothing dispatched", spec.global());
            return Ok(None);
        }

        let event = unsafe {
            let mut exec = ExecuteKernel::new(self.kernel);
            for arg in self.args.iter() {
                match arg {
                    KernelArg::Buffer(buf) => exec.set_arg(buf.cl_buffer()),
                    KernelArg::Uint(v) => exec.set_arg(v),
                    KernelArg::Int(v) => exec.set_arg(v),
                    KernelArg::Float(v) => exec.set_arg(v),
                };
            }
            exec.set_global_work_sizes(spec.global());
            if let Some(local) = spec.local() {
                exec.set_local_work_sizes(local);
            }
            exec.enqueue_nd_range(queue)
                .map_err(|e| Error::Dispatch(format!("enqueue failed: {:?}", e)))?
        };

        log::debug!(
            "dispatched {} work items over {:?}",
            spec.work_items(),
            spec.global()
        );
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_spec_dimension_bounds() {
        assert!(WorkSpec::new(&[]).is_err());
        assert!(WorkSpec::new(&[1, 2, 3, 4]).is_err());
        assert!(WorkSpec::new(&[100]).is_ok());
        assert!(WorkSpec::new(&[8, 8, 8]).is_ok());
    }

    #[test]
    fn test_work_spec_zero_size_is_valid_but_empty() {
        let spec = WorkSpec::new(&[0]).unwrap();
        assert!(spec.is_empty());
        assert_eq!(spec.work_items(), 0);

        let spec = WorkSpec::new(&[4, 0, 2]).unwrap();
        assert!(spec.is_empty());
        assert_eq!(spec.work_items(), 0);

        let spec = WorkSpec::new(&[4, 2]).unwrap();
        assert!(!spec.is_empty());
        assert_eq!(spec.work_items(), 8);
    }

    #[test]
    fn test_work_spec_local_dimension_mismatch() {
        let err = WorkSpec::new(&[64, 64]).unwrap().with_local(&[16]);
        assert!(err.is_err());

        let spec = WorkSpec::new(&[64, 64]).unwrap().with_local(&[16, 4]).unwrap();
        assert_eq!(spec.local(), Some(&[16, 4][..]));
    }

    #[test]
    fn test_work_spec_zero_local_rejected() {
        assert!(WorkSpec::new(&[64]).unwrap().with_local(&[0]).is_err());
    }

    #[test]
    fn test_arg_table_out_of_order_binding() {
        let mut table = ArgTable::new();
        table.bind(2, KernelArg::Uint(7));
        table.bind(0, KernelArg::Float(1.0));
        table.bind(1, KernelArg::Int(-3));

        assert_eq!(table.len(), 3);
        assert!(table.missing().is_empty());
    }

    #[test]
    fn test_arg_table_reports_gaps() {
        let mut table = ArgTable::new();
        table.bind(0, KernelArg::Uint(1));
        table.bind(3, KernelArg::Uint(2));

        assert_eq!(table.len(), 4);
        assert_eq!(table.missing(), vec![1, 2]);
    }

    #[test]
    fn test_arg_table_rebinding_overwrites() {
        let mut table = ArgTable::new();
        table.bind(0, KernelArg::Uint(1));
        table.bind(0, KernelArg::Uint(2));

        assert_eq!(table.len(), 1);
        assert!(table.missing().is_empty());
        match table.iter().next() {
            Some(KernelArg::Uint(v)) => assert_eq!(*v, 2),
            _ => panic!("expected the overwritten Uint binding"),
        };
    }
}
