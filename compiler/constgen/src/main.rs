//! The executable resolving and instantiating value-parameterized generics.

use std::process::ExitCode;

use clap::Parser;
use constgen_driver::Arguments;

fn main() -> ExitCode {
    env_logger::init();
    constgen_driver::run(Arguments::parse())
}
