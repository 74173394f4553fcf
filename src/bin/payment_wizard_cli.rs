use std::path::PathBuf;
use std::process::ExitCode;

use payment_wizard::cli::{output, run_cli};

fn main() -> ExitCode {
    payment_wizard::init();

    let Some(snapshot) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: payment_wizard_cli <snapshot.json>");
        return ExitCode::from(2);
    };

    match run_cli(&snapshot) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "payment shell failed");
            output::error(&err);
            ExitCode::FAILURE
        }
    }
}
