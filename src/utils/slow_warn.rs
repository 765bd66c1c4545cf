use log::warn;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Awaits `call` to completion, logging a warning every `threshold` while it is
/// still pending. Never cancels the call.
pub async fn await_with_slow_warning<F: Future>(
    what: &str,
    threshold: Duration,
    call: F,
) -> F::Output {
    tokio::pin!(call);
    let started = Instant::now();
    let mut warned = false;
    loop {
        match timeout(threshold, &mut call).await {
            Ok(output) => {
                if warned {
                    warn!(
                        "{what} finished after {:.1}s",
                        started.elapsed().as_secs_f32()
                    );
                }
                return output;
            }
            Err(_) => {
                warned = true;
                warn!(
                    "{what} still pending after {:.0}s",
                    started.elapsed().as_secs_f32()
                );
            }
        }
    }
}
