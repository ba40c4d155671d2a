//! Kernel program compilation and entry point extraction.

use opencl3::context::Context;
use opencl3::kernel::Kernel;
use opencl3::program::Program;

use crate::error::{Error, Result};

/// Compiles one or more kernel source fragments into a program built for
/// every device in `context`.
///
/// Fragments are concatenated in order. On a compile failure the driver's
/// diagnostic log is carried verbatim in [`Error::Build`]; it must never
/// be swallowed, since kernel source bugs are otherwise silent.
pub fn compile(context: &Context, sources: &[&str]) -> Result<Program> {
    let source = sources.concat();
    // opencl3 folds clCreateProgramWithSource + clBuildProgram into one
    // call and returns the build log as the error value.
    Program::create_and_build_from_source(context, &source, "")
        .map_err(|log| Error::Build { log: log.to_string() })
}

/// Extracts the named entry point from a built program.
pub fn extract_kernel(program: &Program, name: &str) -> Result<Kernel> {
    Kernel::create(program, name).map_err(|e| Error::EntryPointNotFound {
        name: name.to_string(),
        detail: format!("{:?}", e),
    })
}
