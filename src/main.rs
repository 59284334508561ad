use std::process::ExitCode;

fn main() -> ExitCode {
    match preflight::run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", preflight::core::output::failure_line(&e.to_string()));
            ExitCode::from(1)
        }
    }
}
