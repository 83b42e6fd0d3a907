use std::future::Future;

use tokio::sync::Mutex;

/// Guards a fallible action so that it completes successfully at most once
/// for the lifetime of the guard. A failed attempt leaves the guard armed and
/// the next caller retries. The lock is held across the action, so concurrent
/// callers serialize behind it and the action never runs twice in parallel.
#[derive(Debug, Default)]
pub struct TryOnce {
    succeeded: Mutex<bool>,
}

impl TryOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` unless a previous call already succeeded.
    pub async fn run_once<F, Fut, E>(&self, f: F) -> Result<(), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let mut succeeded = self.succeeded.lock().await;
        if *succeeded {
            return Ok(());
        }
        f().await?;
        *succeeded = true;
        Ok(())
    }
}
