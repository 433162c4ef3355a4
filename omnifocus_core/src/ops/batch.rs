// src/ops/batch.rs
// Sequential fold over batch items. Items never run in parallel; the
// external database is a single process and per-item error attribution
// must stay unambiguous. One item's failure never aborts the rest.

use std::future::Future;

use crate::outcome::{BatchItemResult, BatchOutcome};

pub async fn apply_to_all<T, F, Fut>(items: Vec<T>, mut op: F) -> BatchOutcome
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = BatchItemResult>,
{
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        results.push(op(item).await);
    }
    BatchOutcome::from_results(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OmniFocusError;

    #[tokio::test]
    async fn middle_failure_does_not_abort() {
        let outcome = apply_to_all(vec![1, 2, 3], |n| async move {
            if n == 2 {
                BatchItemResult::failed(
                    None,
                    Some(n.to_string()),
                    &OmniFocusError::NotFound {
                        entity: "Task",
                        identifier: n.to_string(),
                    },
                )
            } else {
                BatchItemResult::ok(format!("t{}", n), n.to_string())
            }
        })
        .await;

        assert!(outcome.success);
        assert_eq!(outcome.results.len(), 3);
        assert!(outcome.results[0].success);
        assert!(!outcome.results[1].success);
        assert!(outcome.results[2].success);
    }

    #[tokio::test]
    async fn results_preserve_input_order() {
        let outcome = apply_to_all(vec!["a", "b", "c"], |s| async move {
            BatchItemResult::ok(s, s)
        })
        .await;
        let ids: Vec<_> = outcome
            .results
            .iter()
            .map(|r| r.item_id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn all_failures_means_aggregate_failure() {
        let outcome = apply_to_all(vec![1], |n| async move {
            BatchItemResult::failed(
                None,
                Some(n.to_string()),
                &OmniFocusError::External("host not running".into()),
            )
        })
        .await;
        assert!(!outcome.success);
    }
}
