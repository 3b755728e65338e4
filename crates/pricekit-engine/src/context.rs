//! # PricingDataContext
//!
//! The request-scoped bundle of facet maps behind one pricing operation.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     PricingDataContext                                  │
//! │                                                                         │
//! │  new(products) classifies the working set ONCE:                         │
//! │     all ids ── tier-price ids ── discount ids ── bundled ── grouped     │
//! │                                                                         │
//! │  each facet map binds to the matching subset, so a product whose flags  │
//! │  say "no tier prices" is never part of a tier-price batch               │
//! │                                                                         │
//! │   attributes ───────────┐                                               │
//! │   attribute combos ─────┤                                               │
//! │   tier prices ──────────┤                                               │
//! │   categories ───────────┼──► BatchedLazyMap (lazy, one batch each)      │
//! │   manufacturers ────────┤                                               │
//! │   applied discounts ────┤                                               │
//! │   bundle items ─────────┤                                               │
//! │   associated products ──┘                                               │
//! │                                                                         │
//! │  collect(ids)  extends every facet in one coordinated step              │
//! │  clear()       full reset for reuse with a different product set        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One context instance belongs to one request/operation; it is not designed
//! for concurrent mutation from multiple tasks.

use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use pricekit_core::{
    AttributeCombination, AttributePricingItem, BundleItem, CategoryId, Discount, ManufacturerId,
    PricingError, Product, ProductId, ProductType, StoreId, TierPrice,
};

use crate::error::{EngineError, EngineResult, Facet};
use crate::lazy_map::{BatchedLazyMap, FetchFn};

// =============================================================================
// Fetch Delegates
// =============================================================================

/// The batched fetch functions the persistence layer supplies, one per facet.
///
/// A delegate left as `None` makes any access to that facet fail with
/// [`EngineError::MissingFetchDelegate`] - immediately, not deferred.
#[derive(Clone, Default)]
pub struct FetchDelegates {
    pub attributes: Option<FetchFn<AttributePricingItem>>,
    pub attribute_combinations: Option<FetchFn<AttributeCombination>>,
    pub tier_prices: Option<FetchFn<TierPrice>>,
    pub categories: Option<FetchFn<CategoryId>>,
    pub manufacturers: Option<FetchFn<ManufacturerId>>,
    pub applied_discounts: Option<FetchFn<Discount>>,
    pub bundle_items: Option<FetchFn<BundleItem>>,
    /// Child/associated product data, keyed by the parent (bundled or
    /// grouped) product id.
    pub associated_products: Option<FetchFn<Product>>,
}

impl std::fmt::Debug for FetchDelegates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchDelegates")
            .field("attributes", &self.attributes.is_some())
            .field("attribute_combinations", &self.attribute_combinations.is_some())
            .field("tier_prices", &self.tier_prices.is_some())
            .field("categories", &self.categories.is_some())
            .field("manufacturers", &self.manufacturers.is_some())
            .field("applied_discounts", &self.applied_discounts.is_some())
            .field("bundle_items", &self.bundle_items.is_some())
            .field("associated_products", &self.associated_products.is_some())
            .finish()
    }
}

// =============================================================================
// PricingDataContext
// =============================================================================

/// Request-scoped facet cache for a working set of products.
///
/// Facet maps are constructed lazily on first access; the first read of a
/// facet triggers exactly one batched fetch for all ids of interest.
pub struct PricingDataContext {
    store_id: StoreId,
    delegates: FetchDelegates,

    // Derived id subsets, classified once at construction.
    all_ids: Vec<ProductId>,
    tier_price_ids: Vec<ProductId>,
    discount_ids: Vec<ProductId>,
    bundled_ids: Vec<ProductId>,
    grouped_ids: Vec<ProductId>,

    /// Ids collected after construction; replayed into facet maps that are
    /// built later so a drill-down extends every facet consistently.
    late_collected: Mutex<Vec<ProductId>>,

    attributes: OnceCell<BatchedLazyMap<AttributePricingItem>>,
    attribute_combinations: OnceCell<BatchedLazyMap<AttributeCombination>>,
    tier_prices: OnceCell<BatchedLazyMap<TierPrice>>,
    categories: OnceCell<BatchedLazyMap<CategoryId>>,
    manufacturers: OnceCell<BatchedLazyMap<ManufacturerId>>,
    applied_discounts: OnceCell<BatchedLazyMap<Discount>>,
    bundle_items: OnceCell<BatchedLazyMap<BundleItem>>,
    associated_products: OnceCell<BatchedLazyMap<Product>>,
}

impl PricingDataContext {
    /// Builds a context for `products`, classifying the working set by the
    /// products' facet flags and composition type.
    pub fn new(
        products: &[Product],
        store_id: StoreId,
        delegates: FetchDelegates,
    ) -> EngineResult<Self> {
        if products.is_empty() {
            return Err(PricingError::EmptyProductSet.into());
        }

        let all_ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
        let tier_price_ids: Vec<ProductId> = products
            .iter()
            .filter(|p| p.has_tier_prices)
            .map(|p| p.id)
            .collect();
        let discount_ids: Vec<ProductId> = products
            .iter()
            .filter(|p| p.has_discounts_applied)
            .map(|p| p.id)
            .collect();
        let bundled_ids: Vec<ProductId> = products
            .iter()
            .filter(|p| p.product_type == ProductType::Bundled)
            .map(|p| p.id)
            .collect();
        let grouped_ids: Vec<ProductId> = products
            .iter()
            .filter(|p| p.product_type == ProductType::Grouped)
            .map(|p| p.id)
            .collect();

        debug!(
            products = all_ids.len(),
            with_tier_prices = tier_price_ids.len(),
            with_discounts = discount_ids.len(),
            bundled = bundled_ids.len(),
            grouped = grouped_ids.len(),
            "pricing data context created"
        );

        Ok(PricingDataContext {
            store_id,
            delegates,
            all_ids,
            tier_price_ids,
            discount_ids,
            bundled_ids,
            grouped_ids,
            late_collected: Mutex::new(Vec::new()),
            attributes: OnceCell::new(),
            attribute_combinations: OnceCell::new(),
            tier_prices: OnceCell::new(),
            categories: OnceCell::new(),
            manufacturers: OnceCell::new(),
            applied_discounts: OnceCell::new(),
            bundle_items: OnceCell::new(),
            associated_products: OnceCell::new(),
        })
    }

    /// The store this context prices for.
    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    // -------------------------------------------------------------------------
    // Facet accessors
    // -------------------------------------------------------------------------

    /// Priced attribute values, for every product in the working set.
    pub async fn attributes(&self) -> EngineResult<&BatchedLazyMap<AttributePricingItem>> {
        let subset = self.all_ids.clone();
        self.facet_map(
            &self.attributes,
            Facet::Attributes,
            self.delegates.attributes.clone(),
            subset,
        )
        .await
    }

    /// Attribute value combinations with optional price overrides.
    pub async fn attribute_combinations(
        &self,
    ) -> EngineResult<&BatchedLazyMap<AttributeCombination>> {
        let subset = self.all_ids.clone();
        self.facet_map(
            &self.attribute_combinations,
            Facet::AttributeCombinations,
            self.delegates.attribute_combinations.clone(),
            subset,
        )
        .await
    }

    /// Tier prices, restricted to products whose `has_tier_prices` flag is
    /// set. Products without the flag are never part of a tier-price batch.
    pub async fn tier_prices(&self) -> EngineResult<&BatchedLazyMap<TierPrice>> {
        let subset = self.tier_price_ids.clone();
        self.facet_map(
            &self.tier_prices,
            Facet::TierPrices,
            self.delegates.tier_prices.clone(),
            subset,
        )
        .await
    }

    /// Category assignments (category-scoped discount eligibility).
    pub async fn categories(&self) -> EngineResult<&BatchedLazyMap<CategoryId>> {
        let subset = self.all_ids.clone();
        self.facet_map(
            &self.categories,
            Facet::Categories,
            self.delegates.categories.clone(),
            subset,
        )
        .await
    }

    /// Manufacturer assignments.
    pub async fn manufacturers(&self) -> EngineResult<&BatchedLazyMap<ManufacturerId>> {
        let subset = self.all_ids.clone();
        self.facet_map(
            &self.manufacturers,
            Facet::Manufacturers,
            self.delegates.manufacturers.clone(),
            subset,
        )
        .await
    }

    /// Discounts assigned to products whose `has_discounts_applied` flag is
    /// set.
    pub async fn applied_discounts(&self) -> EngineResult<&BatchedLazyMap<Discount>> {
        let subset = self.discount_ids.clone();
        self.facet_map(
            &self.applied_discounts,
            Facet::AppliedDiscounts,
            self.delegates.applied_discounts.clone(),
            subset,
        )
        .await
    }

    /// Bundle composition, restricted to bundled products.
    pub async fn bundle_items(&self) -> EngineResult<&BatchedLazyMap<BundleItem>> {
        let subset = self.bundled_ids.clone();
        self.facet_map(
            &self.bundle_items,
            Facet::BundleItems,
            self.delegates.bundle_items.clone(),
            subset,
        )
        .await
    }

    /// Child/associated product data, keyed by parent id. Serves bundled
    /// parents (bundle children) and grouped parents (associated products).
    pub async fn associated_products(&self) -> EngineResult<&BatchedLazyMap<Product>> {
        let mut subset = self.bundled_ids.clone();
        subset.extend(self.grouped_ids.iter().copied());
        self.facet_map(
            &self.associated_products,
            Facet::AssociatedProducts,
            self.delegates.associated_products.clone(),
            subset,
        )
        .await
    }

    // -------------------------------------------------------------------------
    // Working set management
    // -------------------------------------------------------------------------

    /// Extends the working set with additional product ids (e.g. a bundle's
    /// children discovered mid-calculation). Forwards to every already built
    /// facet map and is replayed into maps built later, so the drill-down
    /// extends all facets in one coordinated step. Idempotent for ids already
    /// known; resolved ids are never re-fetched.
    pub async fn collect(&self, ids: &[ProductId]) {
        self.late_collected.lock().await.extend(ids.iter().copied());

        if let Some(map) = self.attributes.get() {
            map.collect(ids).await;
        }
        if let Some(map) = self.attribute_combinations.get() {
            map.collect(ids).await;
        }
        if let Some(map) = self.tier_prices.get() {
            map.collect(ids).await;
        }
        if let Some(map) = self.categories.get() {
            map.collect(ids).await;
        }
        if let Some(map) = self.manufacturers.get() {
            map.collect(ids).await;
        }
        if let Some(map) = self.applied_discounts.get() {
            map.collect(ids).await;
        }
        if let Some(map) = self.bundle_items.get() {
            map.collect(ids).await;
        }
        if let Some(map) = self.associated_products.get() {
            map.collect(ids).await;
        }
    }

    /// Drops every facet map's memoized entries while keeping the maps and
    /// the working set. The next read of each facet issues a fresh batch.
    /// This is what the cache-bypass calculation option uses.
    pub async fn invalidate(&self) {
        if let Some(map) = self.attributes.get() {
            map.clear().await;
        }
        if let Some(map) = self.attribute_combinations.get() {
            map.clear().await;
        }
        if let Some(map) = self.tier_prices.get() {
            map.clear().await;
        }
        if let Some(map) = self.categories.get() {
            map.clear().await;
        }
        if let Some(map) = self.manufacturers.get() {
            map.clear().await;
        }
        if let Some(map) = self.applied_discounts.get() {
            map.clear().await;
        }
        if let Some(map) = self.bundle_items.get() {
            map.clear().await;
        }
        if let Some(map) = self.associated_products.get() {
            map.clear().await;
        }
    }

    /// Full reset: drops all facet maps and the derived id lists so the
    /// instance can be reused for an unrelated product set within the same
    /// request. The caller seeds the new working set via [`Self::collect`].
    pub fn clear(&mut self) {
        self.all_ids.clear();
        self.tier_price_ids.clear();
        self.discount_ids.clear();
        self.bundled_ids.clear();
        self.grouped_ids.clear();
        self.late_collected = Mutex::new(Vec::new());

        self.attributes.take();
        self.attribute_combinations.take();
        self.tier_prices.take();
        self.categories.take();
        self.manufacturers.take();
        self.applied_discounts.take();
        self.bundle_items.take();
        self.associated_products.take();
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Lazily constructs a facet map bound to `subset` plus any ids collected
    /// since construction. A missing delegate surfaces here, at the access.
    async fn facet_map<'a, T: Clone>(
        &'a self,
        cell: &'a OnceCell<BatchedLazyMap<T>>,
        facet: Facet,
        delegate: Option<FetchFn<T>>,
        subset: Vec<ProductId>,
    ) -> EngineResult<&'a BatchedLazyMap<T>> {
        cell.get_or_try_init(|| async {
            let fetch = delegate.ok_or(EngineError::MissingFetchDelegate { facet })?;
            let mut universe = subset;
            universe.extend(self.late_collected.lock().await.iter().copied());
            Ok(BatchedLazyMap::new(facet, fetch, universe))
        })
        .await
    }
}

impl std::fmt::Debug for PricingDataContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingDataContext")
            .field("store_id", &self.store_id)
            .field("products", &self.all_ids.len())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
