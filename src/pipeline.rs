//! End-to-end pipeline: locate a device, move data on, run the kernel,
//! move the result back, release everything.
//!
//! Handles are acquired as ledger-tracked locals in acquisition order, so
//! they release in strict reverse order on the success path and on every
//! `?` early return.

use bytemuck::{cast_slice, cast_slice_mut};
use log::info;

use crate::buffer::{AccessMode, DeviceBuffer};
use crate::context;
use crate::dispatch::{Dispatcher, KernelArg, WorkSpec};
use crate::error::{Error, Result};
use crate::ledger::ResourceLedger;
use crate::locator::{self, DeviceTypeFilter};
use crate::program;

/// Which device to target and what to run on it.
#[derive(Debug, Clone)]
pub struct PipelineConfig<'a> {
    pub platform_index: usize,
    pub device_index: usize,
    pub device_type: DeviceTypeFilter,
    /// Kernel source fragments, concatenated in order.
    pub sources: &'a [&'a str],
    /// Entry point name inside the built program.
    pub kernel_name: &'a str,
}

impl<'a> PipelineConfig<'a> {
    /// Configuration for the first device of the first platform.
    pub fn new(sources: &'a [&'a str], kernel_name: &'a str) -> Self {
        PipelineConfig {
            platform_index: 0,
            device_index: 0,
            device_type: DeviceTypeFilter::All,
            sources,
            kernel_name,
        }
    }
}

/// Runs the two-inputs-one-output pipeline and returns the downloaded
/// result array.
pub fn run(cfg: &PipelineConfig, a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
    let ledger = ResourceLedger::new();
    run_with_ledger(cfg, &ledger, a, b)
}

/// Like [`run`], recording every acquisition and release in `ledger` so
/// callers can verify that nothing leaked.
pub fn run_with_ledger(
    cfg: &PipelineConfig,
    ledger: &ResourceLedger,
    a: &[f32],
    b: &[f32],
) -> Result<Vec<f32>> {
    if a.len() != b.len() {
        return Err(Error::Transfer(format!(
            "input arrays differ in length: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let platforms = locator::list_platforms()?;
    let platform = locator::select(platforms, cfg.platform_index, "platform")?;
    let devices = locator::list_devices(&platform, cfg.device_type)?;
    let device = ledger.track(locator::select(devices, cfg.device_index, "device")?);
    info!(
        "dispatching to {}",
        device.name().unwrap_or_else(|_| "unknown device".into())
    );

    let context = ledger.track(context::create_context(&device)?);
    let queue = ledger.track(context::create_queue(&context, &device)?);

    let input_a = ledger.track(DeviceBuffer::with_host_data(
        &context,
        AccessMode::ReadOnly,
        cast_slice(a),
    )?);
    let input_b = ledger.track(DeviceBuffer::with_host_data(
        &context,
        AccessMode::ReadOnly,
        cast_slice(b),
    )?);
    let output = ledger.track(DeviceBuffer::allocate(
        &context,
        AccessMode::ReadWrite,
        std::mem::size_of_val(a),
    )?);

    let program = ledger.track(program::compile(&context, cfg.sources)?);
    let kernel = ledger.track(program::extract_kernel(&program, cfg.kernel_name)?);

    let mut dispatcher = Dispatcher::new(&kernel);
    dispatcher.bind(0, KernelArg::Buffer(&input_a));
    dispatcher.bind(1, KernelArg::Buffer(&input_b));
    dispatcher.bind(2, KernelArg::Buffer(&output));

    let work = WorkSpec::new(&[a.len()])?;
    dispatcher.dispatch(&queue, &work)?;

    let mut result = vec![0.0f32; a.len()];
    output.download(&queue, cast_slice_mut(&mut result))?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_inputs_rejected_before_device_work() {
        let ledger = ResourceLedger::new();
        let cfg = PipelineConfig::new(&["__kernel void t() {}"], "t");

        let err = run_with_ledger(&cfg, &ledger, &[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(matches!(err, Error::Transfer(_)));
        // Rejected before anything was acquired.
        assert_eq!(ledger.tracked(), 0);
        assert_eq!(ledger.outstanding(), 0);
    }
}
