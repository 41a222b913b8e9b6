// src/main.rs

use std::process::ExitCode;

use buildc::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("buildc error: {err:?}");
        return ExitCode::from(2);
    }

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("buildc error: {err:?}");
            ExitCode::from(2)
        }
    }
}
