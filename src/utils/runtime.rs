use anyhow::Result;

/// Everything in the dashboard runs on one thread, ticks and commands are handled one at a time.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
