//! # pricekit-core: Pure Pricing Logic for PriceKit
//!
//! This crate is the **heart** of PriceKit. It contains all pricing rules
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PriceKit Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Calling Feature (catalog / cart / PDP)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    pricekit-engine                              │   │
//! │  │    BatchedLazyMap ──► PricingDataContext ──► Pipeline           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pricekit-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   tier    │  │   error   │  │   │
//! │  │   │  Product  │  │   Money   │  │  filters  │  │  Pricing  │  │   │
//! │  │   │ TierPrice │  │  bps math │  │ selection │  │   Error   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, TierPrice, Discount, BundleItem, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`tier`] - Tier price filtering, deduplication and selection
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use pricekit_core::money::Money;
//!
//! // Create money from cents (never from floats!)
//! let price = Money::from_cents(10_000); // $100.00
//!
//! // Percentage math in basis points (2000 bps = 20%)
//! let discounted = price.apply_percentage_discount(2_000);
//! assert_eq!(discounted.cents(), 8_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod tier;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use pricekit_core::Money` instead of
// `use pricekit_core::money::Money`

pub use error::{PricingError, PricingResult};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum purchase quantity accepted by a pricing request.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 100000 instead of 10) from
/// blowing up tier selection and line totals. Can be made configurable later.
pub const MAX_PURCHASE_QUANTITY: u32 = 10_000;

/// Maximum nesting depth for bundles-inside-bundles.
///
/// ## Business Reason
/// A bundle whose child is itself a bundle is legal; a cycle is not. The
/// engine stops recursing past this depth and reports an error instead of
/// spinning forever on miswired catalog data.
pub const MAX_BUNDLE_DEPTH: u32 = 8;
