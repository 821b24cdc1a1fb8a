use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::ListView;
use crate::error::ApiError;
use crate::models::Record;

/// Backend listing call for one kind of record.
///
/// `query` is a filter hint passed through to the server. The full result
/// comes back in one response; all paging happens client side.
#[async_trait]
pub trait RecordSource<R: Record>: Send + Sync {
    async fn fetch(&self, query: Option<&str>) -> Result<Vec<R>, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
}

impl FetchTicket {
    pub(crate) fn new(seq: u64) -> Self {
        Self { seq }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

pub type SharedListView<R> = Arc<Mutex<ListView<R>>>;

pub fn shared<R: Record>(view: ListView<R>) -> SharedListView<R> {
    Arc::new(Mutex::new(view))
}

/// Fetch and apply, holding the lock only around the bookkeeping so the view
/// stays usable while the request is in flight. Returns whether the result
/// was applied.
pub async fn refresh<R, S>(view: &SharedListView<R>, source: &S, query: Option<&str>) -> bool
where
    R: Record,
    S: RecordSource<R> + ?Sized,
{
    let ticket = view.lock().await.begin_fetch();
    let outcome = source.fetch(query).await;
    let applied = view.lock().await.finish_fetch(ticket, outcome);
    if !applied {
        info!("{}: result of fetch #{} superseded", R::NOUN, ticket.seq());
    }
    applied
}

pub fn spawn_refresh<R, S>(view: SharedListView<R>, source: Arc<S>, query: Option<String>) -> JoinHandle<bool>
where
    R: Record,
    S: RecordSource<R> + ?Sized + 'static,
{
    tokio::spawn(async move { refresh(&view, source.as_ref(), query.as_deref()).await })
}
