//! Platform and device enumeration.
//!
//! Ordering of the returned platforms and devices is driver-defined and
//! treated as opaque; selection is purely by index.

use opencl3::device::{
    Device, CL_DEVICE_TYPE_ACCELERATOR, CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_CPU,
    CL_DEVICE_TYPE_GPU,
};
use opencl3::platform::{get_platforms, Platform};
use opencl3::types::cl_device_type;

use crate::error::{Error, Result};

/// Which device classes to include when listing devices on a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceTypeFilter {
    Cpu,
    Gpu,
    Accelerator,
    #[default]
    All,
}

impl DeviceTypeFilter {
    /// Returns the OpenCL device-type bitmask for this filter.
    pub fn device_type(self) -> cl_device_type {
        match self {
            DeviceTypeFilter::Cpu => CL_DEVICE_TYPE_CPU,
            DeviceTypeFilter::Gpu => CL_DEVICE_TYPE_GPU,
            DeviceTypeFilter::Accelerator => CL_DEVICE_TYPE_ACCELERATOR,
            DeviceTypeFilter::All => CL_DEVICE_TYPE_ALL,
        }
    }
}

impl std::fmt::Display for DeviceTypeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeviceTypeFilter::Cpu => "cpu",
            DeviceTypeFilter::Gpu => "gpu",
            DeviceTypeFilter::Accelerator => "accelerator",
            DeviceTypeFilter::All => "all",
        };
        write!(f, "{}", name)
    }
}

/// Lists all available OpenCL platforms.
pub fn list_platforms() -> Result<Vec<Platform>> {
    let platforms = get_platforms()
        .map_err(|e| Error::Enumeration(format!("failed to query platforms: {:?}", e)))?;

    if platforms.is_empty() {
        return Err(Error::Enumeration("no OpenCL platforms found".into()));
    }

    Ok(platforms)
}

/// Lists the devices on `platform` matching `filter`.
pub fn list_devices(platform: &Platform, filter: DeviceTypeFilter) -> Result<Vec<Device>> {
    let device_ids = platform
        .get_devices(filter.device_type())
        .map_err(|e| Error::Enumeration(format!("failed to query {} devices: {:?}", filter, e)))?;

    if device_ids.is_empty() {
        return Err(Error::Enumeration(format!(
            "no {} devices found on platform",
            filter
        )));
    }

    Ok(device_ids.into_iter().map(Device::new).collect())
}

/// Takes the element at `index` out of `items`.
///
/// `what` names the kind of item for the error message ("platform",
/// "device").
pub fn select<T>(mut items: Vec<T>, index: usize, what: &str) -> Result<T> {
    if index >= items.len() {
        return Err(Error::Enumeration(format!(
            "{} index {} out of range ({} available)",
            what,
            index,
            items.len()
        )));
    }
    Ok(items.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_bitmask_mapping() {
        assert_eq!(DeviceTypeFilter::Cpu.device_type(), CL_DEVICE_TYPE_CPU);
        assert_eq!(DeviceTypeFilter::Gpu.device_type(), CL_DEVICE_TYPE_GPU);
        assert_eq!(
            DeviceTypeFilter::Accelerator.device_type(),
            CL_DEVICE_TYPE_ACCELERATOR
        );
        assert_eq!(DeviceTypeFilter::All.device_type(), CL_DEVICE_TYPE_ALL);
        assert_eq!(DeviceTypeFilter::default(), DeviceTypeFilter::All);
    }

    #[test]
    fn test_select_in_range() {
        let picked = select(vec!["a", "b", "c"], 1, "platform").unwrap();
        assert_eq!(picked, "b");
    }

    #[test]
    fn test_select_out_of_range() {
        let err = select(vec![10, 20], 2, "device").unwrap_err();
        match err {
            Error::Enumeration(msg) => {
                assert!(msg.contains("device index 2"));
                assert!(msg.contains("2 available"));
            }
            other => panic!("expected Enumeration, got {:?}", other),
        }
    }

    #[test]
    fn test_select_from_empty() {
        let err = select(Vec::<u32>::new(), 0, "device").unwrap_err();
        assert!(matches!(err, Error::Enumeration(_)));
    }
}
