//! # Engine Error Types
//!
//! Errors raised while driving the data context and the calculator pipeline.
//!
//! ## Design Principles
//! - A fetch-delegate failure aborts the pricing operation; no retry, no
//!   partial merge, no partially populated result escapes
//! - A facet accessed without a configured delegate is an immediate error at
//!   that access, never a deferred or swallowed one
//! - Reentrant rule evaluation is NOT an error (it resolves to "no match")

use thiserror::Error;

use pricekit_core::{PricingError, ProductId};

// =============================================================================
// Fetch Error
// =============================================================================

/// Whatever the injected persistence delegate failed with.
///
/// The engine does not interpret it; it only attaches the facet name and
/// propagates.
pub type FetchError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The data facets a [`crate::context::PricingDataContext`] can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Attributes,
    AttributeCombinations,
    TierPrices,
    Categories,
    Manufacturers,
    AppliedDiscounts,
    BundleItems,
    AssociatedProducts,
}

impl Facet {
    /// Stable name used in error messages and log fields.
    pub const fn name(&self) -> &'static str {
        match self {
            Facet::Attributes => "attributes",
            Facet::AttributeCombinations => "attribute_combinations",
            Facet::TierPrices => "tier_prices",
            Facet::Categories => "categories",
            Facet::Manufacturers => "manufacturers",
            Facet::AppliedDiscounts => "applied_discounts",
            Facet::BundleItems => "bundle_items",
            Facet::AssociatedProducts => "associated_products",
        }
    }
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Engine Error
// =============================================================================

/// Errors from the batched data context and the calculator pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A facet was accessed but no fetch delegate was supplied for it.
    #[error("No fetch delegate configured for facet '{facet}'")]
    MissingFetchDelegate { facet: Facet },

    /// The injected fetch delegate failed. Propagated to the caller of the
    /// read that triggered the batch.
    #[error("Batched fetch for facet '{facet}' failed: {source}")]
    Fetch {
        facet: Facet,
        #[source]
        source: FetchError,
    },

    /// A bundle child referenced by a bundle item was not present in the
    /// associated-products facet for its parent.
    #[error("Bundle child product {child_id} of parent {parent_id} not resolvable")]
    BundleChildNotFound {
        parent_id: ProductId,
        child_id: ProductId,
    },

    /// A pipeline was supplied with no stages at all.
    #[error("Calculator pipeline must contain at least one stage")]
    EmptyPipeline,

    /// Contract violation bubbled up from the pure core.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================
