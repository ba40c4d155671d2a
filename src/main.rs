//! clsmoke CLI: run the reference scenario against a real device.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};

use clsmoke::reference::{self, MATCH_TOLERANCE};
use clsmoke::{pipeline, DeviceTypeFilter, PipelineConfig};

/// Exit code when the kernel source file cannot be read.
const SOURCE_READ_FAILED: i32 = 10;

#[derive(Parser)]
#[command(name = "clsmoke")]
#[command(about = "Run a kernel on an OpenCL device and verify the result on the host")]
#[command(version)]
struct Cli {
    /// Kernel source file
    #[arg(value_name = "KERNEL", default_value = "kernels/testkernel.cl")]
    kernel: PathBuf,

    /// Platform index
    #[arg(long, default_value_t = 0)]
    platform: usize,

    /// Device index within the platform
    #[arg(long, default_value_t = 0)]
    device: usize,

    /// Device type filter
    #[arg(long, value_enum, default_value_t = DeviceTypeArg::All)]
    device_type: DeviceTypeArg,

    /// Number of elements per input array
    #[arg(long, default_value_t = 100)]
    len: usize,

    /// Kernel entry point name
    #[arg(long, default_value = "testKernel")]
    entry: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DeviceTypeArg {
    All,
    Cpu,
    Gpu,
    #[value(name = "accel")]
    Accelerator,
}

impl From<DeviceTypeArg> for DeviceTypeFilter {
    fn from(arg: DeviceTypeArg) -> Self {
        match arg {
            DeviceTypeArg::All => DeviceTypeFilter::All,
            DeviceTypeArg::Cpu => DeviceTypeFilter::Cpu,
            DeviceTypeArg::Gpu => DeviceTypeFilter::Gpu,
            DeviceTypeArg::Accelerator => DeviceTypeFilter::Accelerator,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.kernel) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("clsmoke: failed to read {}: {}", cli.kernel.display(), e);
            process::exit(SOURCE_READ_FAILED);
        }
    };

    let (a, b) = reference::scenario_inputs(cli.len);

    let sources = [source.as_str()];
    let cfg = PipelineConfig {
        platform_index: cli.platform,
        device_index: cli.device,
        device_type: cli.device_type.into(),
        sources: &sources,
        kernel_name: &cli.entry,
    };

    let device_out = match pipeline::run(&cfg, &a, &b) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("clsmoke: {}", e);
            process::exit(e.exit_code());
        }
    };

    let host_out = reference::reference_output(&a, &b);
    println!("GPU: {:?}", device_out);
    println!("CPU: {:?}", host_out);

    let matched = reference::count_matches(&device_out, &host_out, MATCH_TOLERANCE);
    println!("{}/{} were close enough.", matched, cli.len);
}
