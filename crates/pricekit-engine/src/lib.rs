//! # pricekit-engine: Batched Lazy Loading + Calculator Pipeline
//!
//! This crate computes final, customer- and context-specific prices while
//! minimizing backing-store round trips: a per-request data context defers
//! and batches lookups, and an ordered pipeline of calculator stages turns
//! raw catalog data into a [`calculator::PriceCalculationResult`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PriceKit Data Flow                               │
//! │                                                                         │
//! │  Calling feature (catalog listing / cart / product page)                │
//! │       │ products, request, pipeline                                     │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 pricekit-engine (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐  │   │
//! │  │   │PricingService │──►│PricingData-    │──►│ BatchedLazyMap│  │   │
//! │  │   │ (service.rs)  │   │Context         │   │ (lazy_map.rs) │  │   │
//! │  │   │               │   │ (context.rs)   │   │  one batch    │  │   │
//! │  │   │ runs pipeline │   │ 8 facet maps   │   │  per facet    │  │   │
//! │  │   └───────┬───────┘   └────────────────┘   └───────┬───────┘  │   │
//! │  │           │                                         │          │   │
//! │  │           ▼                                         ▼          │   │
//! │  │   ┌───────────────┐                        injected async     │   │
//! │  │   │  calculator/  │                        fetch delegates    │   │
//! │  │   │  6 stages     │                        (persistence side) │   │
//! │  │   └───────────────┘                                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PriceCalculationResult → rendering / order totals                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`lazy_map`] - memoized, batched multi-value map per facet
//! - [`context`] - request-scoped [`context::PricingDataContext`] + delegates
//! - [`calculator`] - stages, pipeline, calculation result
//! - [`request`] - pricing request and calculation options
//! - [`guard`] - keyed reentrancy registry for the monetary cart rules
//! - [`service`] - the orchestrating [`service::PricingService`]
//! - [`error`] - engine error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pricekit_engine::{FetchDelegates, Pipeline, PricingRequest, PricingService};
//!
//! let service = PricingService::new(delegates);
//! let ctx = service.create_context(&products, store_id)?;
//!
//! let request = PricingRequest::new(product, quantity, store_id, "USD");
//! let result = service.calculate(&ctx, &request, &Pipeline::cart()).await?;
//! println!("{}", result.final_unit_price);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod context;
pub mod error;
pub mod guard;
pub mod lazy_map;
pub mod request;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use calculator::{AppliedDiscount, CalculatorStage, Pipeline, PriceCalculationResult};
pub use context::{FetchDelegates, PricingDataContext};
pub use error::{EngineError, EngineResult, Facet, FetchError};
pub use guard::{CartValueRule, ReentrancyGuard, ReentrancyRegistry, RuleKind};
pub use lazy_map::{BatchedLazyMap, FetchFn, FetchOutcome};
pub use request::{CalculationOptions, PricingRequest};
pub use service::PricingService;
