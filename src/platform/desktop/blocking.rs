use anyhow::{Context, Result};

/// Runs file IO and parsing on the blocking pool so the UI task stays responsive.
pub async fn run_blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("blocking task did not complete")
}
