//! Platform timers: `gloo-timers` in the browser, tokio everywhere else.

use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures::future::{select, Either};

pub async fn sleep(duration: Duration) {
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::sleep(duration).await;
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;
}

/// Run `fut` with a deadline. `None` means the deadline won; `fut` is dropped.
pub async fn with_timeout<F: Future>(duration: Duration, fut: F) -> Option<F::Output> {
    let fut = pin!(fut);
    let deadline = pin!(sleep(duration));
    match select(fut, deadline).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(_) => None,
    }
}
