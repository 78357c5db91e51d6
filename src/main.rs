use std::process::ExitCode;

use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    match fr3ki::cli::run().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fr3ki aborted");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
