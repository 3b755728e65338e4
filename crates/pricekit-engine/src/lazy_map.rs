//! # BatchedLazyMap
//!
//! A request-scoped, memoized multimap that defers and batches its backing
//! fetch until first read.
//!
//! ## How It Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     BatchedLazyMap Lifecycle                            │
//! │                                                                         │
//! │  new(fetch, [1,2,3])        collected={1,2,3}  resolved={}              │
//! │       │                                                                 │
//! │  collect([4])               collected={1,2,3,4}                         │
//! │       │                                                                 │
//! │  get(2)  ──► ONE batched fetch([1,2,3,4]) ──► resolved={1,2,3,4}        │
//! │       │                                                                 │
//! │  get(3)                     no fetch (already resolved)                 │
//! │       │                                                                 │
//! │  collect([2])               no-op (idempotent)                          │
//! │       │                                                                 │
//! │  clear()                    back to pre-fetch condition                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - At most one fetch call per id per map lifetime
//! - Reads of resolved ids never re-fetch
//! - A fetch failure propagates to the triggering read and marks nothing
//!   resolved (no partial merge)

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, trace};

use pricekit_core::ProductId;

use crate::error::{EngineError, EngineResult, Facet, FetchError};

// =============================================================================
// Fetch Delegate
// =============================================================================

/// What a batched fetch returns: values grouped by the id they belong to.
/// Ids absent from the map are treated as "no values" and memoized as empty.
pub type FetchOutcome<T> = Result<HashMap<ProductId, Vec<T>>, FetchError>;

/// The injected asynchronous batch fetch: `ids -> map(id -> values)`.
///
/// Supplied by the persistence layer; the engine never issues queries itself.
pub type FetchFn<T> =
    Arc<dyn Fn(Vec<ProductId>) -> BoxFuture<'static, FetchOutcome<T>> + Send + Sync>;

// =============================================================================
// BatchedLazyMap
// =============================================================================

struct MapState<T> {
    /// Ids of interest. BTreeSet keeps fetch batches in deterministic order.
    collected: BTreeSet<ProductId>,
    /// Ids already covered by a completed fetch.
    resolved: HashSet<ProductId>,
    /// Materialized values for resolved ids.
    entries: HashMap<ProductId, Vec<T>>,
}

/// On-demand, memoized multi-value map keyed by product id.
///
/// One instance belongs to one request-scoped context; it is not meant to be
/// shared across unrelated pricing operations. The interior mutex exists so
/// reads can take `&self` while still populating the cache lazily, not for
/// cross-task sharing.
pub struct BatchedLazyMap<T> {
    facet: Facet,
    fetch: FetchFn<T>,
    /// The initial candidate universe; `clear()` restores it.
    universe: Vec<ProductId>,
    state: tokio::sync::Mutex<MapState<T>>,
}

impl<T: Clone> BatchedLazyMap<T> {
    /// Creates a map over `universe`, backed by `fetch`.
    pub fn new(facet: Facet, fetch: FetchFn<T>, universe: Vec<ProductId>) -> Self {
        let collected: BTreeSet<ProductId> = universe.iter().copied().collect();
        BatchedLazyMap {
            facet,
            fetch,
            universe,
            state: tokio::sync::Mutex::new(MapState {
                collected,
                resolved: HashSet::new(),
                entries: HashMap::new(),
            }),
        }
    }

    /// Records additional ids of interest. Idempotent for known ids; already
    /// resolved ids are never fetched again.
    pub async fn collect(&self, ids: &[ProductId]) {
        let mut state = self.state.lock().await;
        state.collected.extend(ids.iter().copied());
    }

    /// Returns the values for `id`, triggering at most one batched fetch for
    /// every collected-but-unresolved id. An id without values yields an
    /// empty vector. An unknown id is collected first, then fetched with the
    /// rest of the pending batch.
    pub async fn get(&self, id: ProductId) -> EngineResult<Vec<T>> {
        let mut state = self.state.lock().await;
        state.collected.insert(id);
        self.resolve_pending(&mut state).await?;
        Ok(state.entries.get(&id).cloned().unwrap_or_default())
    }

    /// Returns every resolved entry, fetching whatever is still pending.
    pub async fn all(&self) -> EngineResult<HashMap<ProductId, Vec<T>>> {
        let mut state = self.state.lock().await;
        self.resolve_pending(&mut state).await?;
        Ok(state.entries.clone())
    }

    /// Discards all resolved state, returning the map to its pre-fetch
    /// condition over the original universe.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.collected = self.universe.iter().copied().collect();
        state.resolved.clear();
        state.entries.clear();
        trace!(facet = %self.facet, "lazy map cleared");
    }

    /// Fetches the union of collected-but-unresolved ids in one batch and
    /// merges the result. On failure nothing is marked resolved.
    async fn resolve_pending(&self, state: &mut MapState<T>) -> EngineResult<()> {
        let pending: Vec<ProductId> = state
            .collected
            .iter()
            .copied()
            .filter(|id| !state.resolved.contains(id))
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        debug!(facet = %self.facet, ids = pending.len(), "batched facet fetch");
        let mut fetched = (self.fetch)(pending.clone())
            .await
            .map_err(|source| EngineError::Fetch {
                facet: self.facet,
                source,
            })?;

        for id in pending {
            let values = fetched.remove(&id).unwrap_or_default();
            state.entries.insert(id, values);
            state.resolved.insert(id);
        }
        Ok(())
    }
}

impl<T> std::fmt::Debug for BatchedLazyMap<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchedLazyMap")
            .field("facet", &self.facet)
            .field("universe", &self.universe.len())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
