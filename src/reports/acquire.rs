// src/reports/acquire.rs
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::extractors::TextExtractor;
use crate::reports::client::ReportSource;
use crate::reports::models::{AcquisitionKey, AcquisitionResult};

type WorkQueue = Arc<Mutex<VecDeque<AcquisitionKey>>>;

/// Fetches and extracts every company x year report on a fixed pool of `width` workers.
///
/// Failures are isolated per key: a missing or unreadable report is simply
/// absent from the result. The call returns once every task has finished.
pub async fn acquire<S, E>(
    source: Arc<S>,
    extractor: Arc<E>,
    companies: &BTreeSet<String>,
    years: &[String],
    width: usize,
) -> AcquisitionResult
where
    S: ReportSource + ?Sized + 'static,
    E: TextExtractor + ?Sized + 'static,
{
    let queue: VecDeque<AcquisitionKey> = companies
        .iter()
        .flat_map(|company| years.iter().map(move |year| AcquisitionKey::new(company, year)))
        .collect();
    let total = queue.len();
    let workers = width.max(1).min(total.max(1));
    tracing::info!("Acquiring {} report(s) with {} worker(s)", total, workers);

    let queue: WorkQueue = Arc::new(Mutex::new(queue));
    let (tx, mut rx) = mpsc::channel::<(AcquisitionKey, String)>(workers);

    let mut pool = JoinSet::new();
    for id in 0..workers {
        pool.spawn(run_worker(
            id,
            Arc::clone(&queue),
            Arc::clone(&source),
            Arc::clone(&extractor),
            tx.clone(),
        ));
    }
    // The collector stops once every worker has dropped its sender.
    drop(tx);

    let mut result = AcquisitionResult::new();
    while let Some((key, text)) = rx.recv().await {
        result.insert(key, text);
    }

    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Acquisition worker terminated abnormally: {}", e);
        }
    }

    tracing::info!("Acquired {} of {} report(s)", result.len(), total);
    result
}

async fn run_worker<S, E>(
    id: usize,
    queue: WorkQueue,
    source: Arc<S>,
    extractor: Arc<E>,
    tx: mpsc::Sender<(AcquisitionKey, String)>,
) where
    S: ReportSource + ?Sized + 'static,
    E: TextExtractor + ?Sized + 'static,
{
    loop {
        let next = queue.lock().await.pop_front();
        let Some(key) = next else { break };
        tracing::debug!("Worker {} picked up {}", id, key);

        let Some(bytes) = source.fetch(&key).await else {
            continue;
        };

        let extractor = Arc::clone(&extractor);
        let text = match tokio::task::spawn_blocking(move || extractor.extract(&bytes)).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Text extraction for {} panicked: {}", key, e);
                continue;
            }
        };

        match text {
            Some(text) => {
                tracing::info!("Extracted {} characters for {}", text.len(), key);
                if tx.send((key, text)).await.is_err() {
                    break;
                }
            }
            None => tracing::warn!("No text extracted for {}", key),
        }
    }
    tracing::debug!("Worker {} finished", id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves `"<company> <year> annual report"` for every key except the failing ones.
    struct StubSource {
        failing: HashSet<AcquisitionKey>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn failing(keys: &[AcquisitionKey]) -> Self {
            Self {
                failing: keys.iter().cloned().collect(),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ReportSource for StubSource {
        async fn fetch(&self, key: &AcquisitionKey) -> Option<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.contains(key) {
                None
            } else {
                Some(format!("{} {} annual report", key.company, key.year).into_bytes())
            }
        }
    }

    struct Utf8Extractor;

    impl TextExtractor for Utf8Extractor {
        fn extract(&self, bytes: &[u8]) -> Option<String> {
            let text = String::from_utf8(bytes.to_vec()).ok()?;
            if text.starts_with("corrupt") {
                None
            } else {
                Some(text)
            }
        }
    }

    fn companies(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn years(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn one_failed_task_leaves_the_other_three() {
        let failing = AcquisitionKey::new("MSFT", "2021");
        let source = Arc::new(StubSource::failing(&[failing.clone()]));

        let result = acquire(
            Arc::clone(&source),
            Arc::new(Utf8Extractor),
            &companies(&["AAPL", "MSFT"]),
            &years(&["2021", "2022"]),
            5,
        )
        .await;

        assert_eq!(result.len(), 3);
        assert!(!result.contains(&failing));
        assert_eq!(result.get(&AcquisitionKey::new("AAPL", "2022")), Some("AAPL 2022 annual report"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_pool_width() {
        let source = Arc::new(StubSource::failing(&[]));

        let result = acquire(
            Arc::clone(&source),
            Arc::new(Utf8Extractor),
            &companies(&["A", "B", "C"]),
            &years(&["2019", "2020", "2021"]),
            2,
        )
        .await;

        assert_eq!(result.len(), 9);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn extraction_failure_omits_the_key() {
        struct CorruptFor2020;

        #[async_trait]
        impl ReportSource for CorruptFor2020 {
            async fn fetch(&self, key: &AcquisitionKey) -> Option<Vec<u8>> {
                if key.year == "2020" {
                    Some(b"corrupt bytes".to_vec())
                } else {
                    Some(b"readable text".to_vec())
                }
            }
        }

        let result = tokio_test::block_on(acquire(
            Arc::new(CorruptFor2020),
            Arc::new(Utf8Extractor),
            &companies(&["AAPL"]),
            &years(&["2020", "2021"]),
            3,
        ));

        assert_eq!(result.len(), 1);
        assert!(result.contains(&AcquisitionKey::new("AAPL", "2021")));
    }

    #[tokio::test]
    async fn empty_inputs_yield_empty_result() {
        let result = acquire(
            Arc::new(StubSource::failing(&[])),
            Arc::new(Utf8Extractor),
            &BTreeSet::new(),
            &years(&["2021"]),
            5,
        )
        .await;

        assert!(result.is_empty());
    }
}
