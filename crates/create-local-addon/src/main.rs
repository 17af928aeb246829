//! Binary entry point for `create-local-addon`.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    create_local_addon::run(std::env::args_os(), stdin, &mut stdout, &mut stderr)
}
