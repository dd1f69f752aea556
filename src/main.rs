// src/main.rs

use std::process::ExitCode;

use checkrun::{cli, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("checkrun: {err:#}");
        return ExitCode::FAILURE;
    }

    match checkrun::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("checkrun: {err:?}");
            ExitCode::FAILURE
        }
    }
}
