//! # Error Types
//!
//! Domain-specific error types for pricekit-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pricekit-core errors (this file)                                       │
//! │  └── PricingError     - Contract violations in pure pricing logic       │
//! │                                                                         │
//! │  pricekit-engine errors (separate crate)                                │
//! │  └── EngineError      - Fetch/facet failures, wraps PricingError        │
//! │                                                                         │
//! │  Flow: PricingError → EngineError → caller of the pricing operation    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, quantity, ...)
//! 3. Errors are enum variants, never String
//! 4. Contract violations fail fast at the API boundary, never default silently

use thiserror::Error;

use crate::types::ProductId;

// =============================================================================
// Pricing Error
// =============================================================================

/// Contract violations in the pure pricing logic.
#[derive(Debug, Error)]
pub enum PricingError {
    /// A pricing operation was started with no products at all.
    #[error("Product set must not be empty")]
    EmptyProductSet,

    /// Quantity is zero or exceeds the accepted maximum.
    #[error("Invalid purchase quantity {requested} (allowed: 1..={max})")]
    InvalidQuantity { requested: u32, max: u32 },

    /// A bundle references itself (directly or through children) deeper than
    /// the allowed nesting.
    #[error("Bundle nesting exceeds {max} levels at product {product_id}")]
    BundleTooDeep { product_id: ProductId, max: u32 },

    /// An exchange rate is zero or negative.
    #[error("Exchange rate for {currency} must be positive, got {rate_micros} micro-units")]
    InvalidExchangeRate { currency: String, rate_micros: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with PricingError.
pub type PricingResult<T> = Result<T, PricingError>;

// =============================================================================
// Unit Tests
// =============================================================================
