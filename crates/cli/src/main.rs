use std::process::ExitCode;

fn main() -> ExitCode {
    bulkrooms_cli::run()
}
