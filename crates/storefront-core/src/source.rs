// Data source seam plus shared tri-state queries on top of it
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::{Product, ProductId};
use crate::Result;

/// Where products come from
///
/// The HTTP provider implements this against the remote catalog; tests plug
/// in mocks. Keeping it a trait means the queries never know about HTTP.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProductSource: Send + Sync {
    /// The whole catalog, in the order the source returns it
    async fn fetch_products(&self) -> Result<Vec<Product>>;

    /// One product; `Ok(None)` when the source has no such id
    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>>;
}

/// What a query currently knows
#[derive(Debug)]
pub enum QueryState<T> {
    Pending,
    Failed { message: String },
    Succeeded { data: Arc<T>, fetched_at: DateTime<Utc> },
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        match self {
            QueryState::Pending => QueryState::Pending,
            QueryState::Failed { message } => QueryState::Failed {
                message: message.clone(),
            },
            QueryState::Succeeded { data, fetched_at } => QueryState::Succeeded {
                data: Arc::clone(data),
                fetched_at: *fetched_at,
            },
        }
    }
}

impl<T> QueryState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, QueryState::Pending)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Succeeded { data, .. } => Some(data.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryState::Failed { message } => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Which request a query stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    AllProducts,
    Product(ProductId),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::AllProducts => write!(f, "products"),
            QueryKey::Product(id) => write!(f, "products/{}", id),
        }
    }
}

type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// One cached request, shared by everyone looking at the same key.
///
/// `refetch` starts over from `Pending` and supersedes whatever was in
/// flight: the old task is aborted, and if its answer still sneaks in, the
/// generation check throws it away.
pub struct SharedQuery<T> {
    key: QueryKey,
    fetcher: Fetcher<T>,
    state: watch::Sender<QueryState<T>>,
    in_flight: Mutex<InFlight>,
}

#[derive(Default)]
struct InFlight {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl<T> SharedQuery<T>
where
    T: Send + Sync + 'static,
{
    fn new(key: QueryKey, fetcher: Fetcher<T>) -> Arc<Self> {
        let (state, _rx) = watch::channel(QueryState::Pending);
        Arc::new(Self {
            key,
            fetcher,
            state,
            in_flight: Mutex::new(InFlight::default()),
        })
    }

    pub fn key(&self) -> QueryKey {
        self.key
    }

    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.subscribe()
    }

    /// Re-issue the request; the query goes back to `Pending` right away
    pub fn refetch(self: &Arc<Self>) {
        let mut in_flight = self.in_flight.lock();
        in_flight.generation = in_flight.generation.wrapping_add(1);
        let generation = in_flight.generation;

        if let Some(task) = in_flight.task.take() {
            debug!("Superseding in-flight request for {}", self.key);
            task.abort();
        }

        self.state.send_replace(QueryState::Pending);
        info!("Fetching {}", self.key);

        let request = (self.fetcher)();
        let query: Weak<Self> = Arc::downgrade(self);
        in_flight.task = Some(tokio::spawn(async move {
            let outcome = request.await;
            if let Some(query) = query.upgrade() {
                query.settle(generation, outcome);
            }
        }));
    }

    /// Wait until the query is no longer pending and return that state
    pub async fn settled(&self) -> QueryState<T> {
        let mut rx = self.subscribe();
        loop {
            {
                let state = rx.borrow_and_update();
                if !state.is_pending() {
                    return (*state).clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }

    fn settle(&self, generation: u64, outcome: Result<T>) {
        let mut in_flight = self.in_flight.lock();
        if in_flight.generation != generation {
            debug!("Discarding stale response for {}", self.key);
            return;
        }
        in_flight.task = None;

        let next = match outcome {
            Ok(data) => {
                debug!("{} succeeded", self.key);
                QueryState::Succeeded {
                    data: Arc::new(data),
                    fetched_at: Utc::now(),
                }
            }
            Err(e) => {
                warn!("{} failed: {}", self.key, e);
                QueryState::Failed {
                    message: e.to_string(),
                }
            }
        };
        self.state.send_replace(next);
    }
}

impl<T> Drop for SharedQuery<T> {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.get_mut().task.take() {
            task.abort();
        }
    }
}

/// Query cache keyed by request, in front of a [`ProductSource`].
///
/// The first caller for a key starts the fetch; later callers get the same
/// [`SharedQuery`] and see the same snapshot. Must be used inside a Tokio
/// runtime since fetches run as spawned tasks.
pub struct ProductQueries {
    source: Arc<dyn ProductSource>,
    products: Mutex<Option<Arc<SharedQuery<Vec<Product>>>>>,
    by_id: Mutex<HashMap<ProductId, Arc<SharedQuery<Option<Product>>>>>,
}

impl ProductQueries {
    pub fn new(source: Arc<dyn ProductSource>) -> Self {
        Self {
            source,
            products: Mutex::new(None),
            by_id: Mutex::new(HashMap::new()),
        }
    }

    /// The full catalog query
    pub fn products(&self) -> Arc<SharedQuery<Vec<Product>>> {
        let mut slot = self.products.lock();
        if let Some(query) = slot.as_ref() {
            return Arc::clone(query);
        }

        let source = Arc::clone(&self.source);
        let fetcher: Fetcher<Vec<Product>> = Arc::new(move || {
            let source = Arc::clone(&source);
            Box::pin(async move { source.fetch_products().await })
        });

        let query = SharedQuery::new(QueryKey::AllProducts, fetcher);
        query.refetch();
        *slot = Some(Arc::clone(&query));
        query
    }

    /// A single product query
    pub fn product(&self, id: ProductId) -> Arc<SharedQuery<Option<Product>>> {
        let mut by_id = self.by_id.lock();
        if let Some(query) = by_id.get(&id) {
            return Arc::clone(query);
        }

        let source = Arc::clone(&self.source);
        let fetcher: Fetcher<Option<Product>> = Arc::new(move || {
            let source = Arc::clone(&source);
            Box::pin(async move { source.fetch_product(id).await })
        });

        let query = SharedQuery::new(QueryKey::Product(id), fetcher);
        query.refetch();
        by_id.insert(id, Arc::clone(&query));
        query
    }
}
