use std::process::ExitCode;

fn main() -> ExitCode {
    heap_rs::run_cli()
}
