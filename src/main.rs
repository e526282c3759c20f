use anyhow::Result;
use tracing::error;
use workpulse::cli::run_cli;

fn main() -> Result<()> {
    run_cli().inspect_err(|e| {
        error!("Error running cli {e:?}");
    })
}
