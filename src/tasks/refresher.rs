use log::{info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::listview::{ListView, LoadState, RecordSource, SharedListView, refresh};
use crate::models::Record;

/// Re-fetch a mounted view on a fixed interval and hand each result to
/// `on_refresh`. Returns once the view has been unmounted.
pub async fn auto_refresh<R, S, F>(
    view: SharedListView<R>,
    source: Arc<S>,
    query: Option<String>,
    every: Duration,
    mut on_refresh: F,
) where
    R: Record,
    S: RecordSource<R> + ?Sized,
    F: FnMut(&ListView<R>) + Send,
{
    info!("Refreshing {} every {}s", R::NOUN, every.as_secs_f64());
    let mut ticker = interval(every);

    loop {
        ticker.tick().await; // first tick fires immediately
        if !view.lock().await.is_mounted() {
            info!("{} view unmounted, stopping refresh", R::NOUN);
            break;
        }

        if refresh(&view, source.as_ref(), query.as_deref()).await {
            let current = view.lock().await;
            if let LoadState::Failed { message, .. } = current.load_state() {
                warn!("Refresh of {} failed: {}", R::NOUN, message);
            }
            on_refresh(&current);
        }
    }
}

/// Run [`auto_refresh`] until `shutdown` resolves, then unmount the view so
/// any fetch still in flight is discarded.
pub async fn auto_refresh_until<R, S, F, Q>(
    view: SharedListView<R>,
    source: Arc<S>,
    query: Option<String>,
    every: Duration,
    on_refresh: F,
    shutdown: Q,
) where
    R: Record,
    S: RecordSource<R> + ?Sized,
    F: FnMut(&ListView<R>) + Send,
    Q: Future<Output = ()>,
{
    tokio::select! {
        _ = auto_refresh(view.clone(), source, query, every, on_refresh) => {}
        _ = shutdown => {
            info!("Shutdown requested, unmounting {} view", R::NOUN);
            view.lock().await.unmount();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::listview::shared;
    use crate::models::Candidate;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{sleep, timeout};

    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RecordSource<Candidate> for Counting {
        async fn fetch(&self, _query: Option<&str>) -> Result<Vec<Candidate>, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok((0..n)
                .map(|i| Candidate {
                    id: i.to_string(),
                    name: format!("Candidate {i}"),
                    party: "Independent".to_string(),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn refreshes_until_unmounted() {
        let view = shared(ListView::<Candidate>::new(10));
        let source = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let seen = Arc::new(AtomicUsize::new(0));

        let task = {
            let seen = seen.clone();
            tokio::spawn(auto_refresh(
                view.clone(),
                source.clone(),
                None,
                Duration::from_millis(10),
                move |v| {
                    seen.store(v.records().len(), Ordering::SeqCst);
                },
            ))
        };

        sleep(Duration::from_millis(45)).await;
        view.lock().await.unmount();

        timeout(Duration::from_secs(1), task)
            .await
            .expect("refresh task should stop after unmount")
            .unwrap();
        assert!(source.calls.load(Ordering::SeqCst) >= 2);
        // Each refresh replaced the records wholesale
        assert!(seen.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn shutdown_unmounts_and_stops() {
        let view = shared(ListView::<Candidate>::new(10));
        let source = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();

        let task = tokio::spawn(auto_refresh_until(
            view.clone(),
            source.clone(),
            None,
            Duration::from_millis(10),
            |_| {},
            async {
                let _ = stopped.await;
            },
        ));

        sleep(Duration::from_millis(35)).await;
        stop.send(()).unwrap();
        timeout(Duration::from_secs(1), task)
            .await
            .expect("refresh task should stop on shutdown")
            .unwrap();

        let calls = source.calls.load(Ordering::SeqCst);
        assert!(calls >= 1);
        let view = view.lock().await;
        assert!(!view.is_mounted());
        assert!(view.records().is_empty());
        drop(view);

        // No further fetches once stopped
        sleep(Duration::from_millis(30)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), calls);
    }
}
