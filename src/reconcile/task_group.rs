use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::future::Future;

/// Runs every future to completion and returns their results in input order.
/// A failing task never cancels its siblings.
pub async fn settle_all<I, F, T, E>(tasks: I) -> Vec<Result<T, E>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    join_all(tasks).await
}

/// Like [`settle_all`] for infallible tasks, with an optional bound on how many
/// run at the same time. Output order matches input order either way.
pub async fn run_all<I, F, T>(tasks: I, limit: Option<usize>) -> Vec<T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = T>,
{
    match limit {
        None => join_all(tasks).await,
        Some(limit) => {
            stream::iter(tasks)
                .buffered(limit.max(1))
                .collect::<Vec<_>>()
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test]
    async fn test_settle_all_keeps_order_and_failures() {
        let tasks = (0..5).map(|i| async move {
            // Later tasks finish first.
            tokio::time::sleep(Duration::from_millis(10 * (5 - i))).await;
            if i % 2 == 0 { Ok(i) } else { Err(format!("task {i}")) }
        });
        let results = settle_all(tasks).await;
        assert_eq!(
            results,
            vec![
                Ok(0),
                Err("task 1".to_string()),
                Ok(2),
                Err("task 3".to_string()),
                Ok(4)
            ]
        );
    }

    #[tokio::test]
    async fn test_run_all_respects_limit() {
        let in_flight = Arc::new(Mutex::new((0usize, 0usize)));
        let tasks = (0..6).map(|i| {
            let in_flight = in_flight.clone();
            async move {
                {
                    let mut guard = in_flight.lock().unwrap();
                    guard.0 += 1;
                    guard.1 = guard.1.max(guard.0);
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.lock().unwrap().0 -= 1;
                i
            }
        });
        let results = run_all(tasks, Some(2)).await;
        assert_eq!(results, vec![0, 1, 2, 3, 4, 5]);
        assert!(in_flight.lock().unwrap().1 <= 2);
    }

    #[tokio::test]
    async fn test_run_all_unbounded() {
        let results = run_all((0..3).map(|i| async move { i * 10 }), None).await;
        assert_eq!(results, vec![0, 10, 20]);
    }
}
