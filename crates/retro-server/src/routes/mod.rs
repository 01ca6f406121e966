pub mod events;
pub mod health;
pub mod reports;
pub mod retro;
pub mod surveys;
pub mod teams;
pub mod ws;

use crate::error::AppError;

/// Run a synchronous database closure on the blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> retro_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(result)
}
