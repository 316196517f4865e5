use std::process::ExitCode;

fn main() -> ExitCode {
    pelada_cli::run()
}
