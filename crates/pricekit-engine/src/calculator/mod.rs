//! # Price Calculator Pipeline
//!
//! An ordered sequence of calculator stages, each consuming and producing the
//! shared [`PriceCalculationResult`] accumulator.
//!
//! ## Stage Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Calculator Pipeline (full order)                       │
//! │                                                                         │
//! │  BasePrice ──► TierPrice ──► AttributeAdjustments ──► BundleItems       │
//! │      │             │                  │                    │            │
//! │      │     overrides base     percentages against    per-item bundles   │
//! │      │     when cheaper       the running total      sum their children │
//! │      ▼                                                                  │
//! │  ... ──► Discounts ──► CurrencyAndRounding                              │
//! │              │                 │                                        │
//! │      percentages against      convert + round per policy,              │
//! │      the running total        render price-per-unit string             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This order (tier price → attribute adjustments → discounts, percentages
//! computed against the running total) is the fixed, documented policy of
//! this implementation. Pipelines are composed per use case by the calling
//! feature - a feature module can insert an extra stage at any position - the
//! order above is what the built-in presets use.
//!
//! Stages are pure functions of `(context, request, result-so-far)`. They
//! read facets through the context (cache population is interior) but never
//! change what the context means.

pub mod attributes;
pub mod base_price;
pub mod bundle;
pub mod currency;
pub mod discount;
pub mod tier_price;

use serde::{Deserialize, Serialize};
use tracing::trace;

use pricekit_core::{DiscountId, Money, ProductId};

use crate::context::PricingDataContext;
use crate::error::{EngineError, EngineResult};
use crate::request::PricingRequest;

// =============================================================================
// Calculation Result
// =============================================================================

/// One discount that actually applied, with the reduction it took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    pub discount_id: DiscountId,
    /// The actual reduction (clamped so the final price never went negative).
    pub amount: Money,
}

/// The mutable accumulator passed through the pipeline.
///
/// Either every requested stage ran and the result is fully populated, or the
/// calculation failed and no result escapes - there is no partial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCalculationResult {
    pub product_id: ProductId,

    /// Unit price before any adjustment (special price already applied).
    pub regular_price: Money,

    /// The tier price that won, if one did.
    pub tier_price: Option<Money>,

    /// Total of all attribute price adjustments.
    pub attribute_adjustment: Money,

    /// Discounts that applied, in application order.
    pub applied_discounts: Vec<AppliedDiscount>,

    /// Sum of all applied discount reductions.
    pub discount_total: Money,

    /// The running/final unit price in the target currency.
    pub final_unit_price: Money,

    /// Final price for the requested quantity.
    pub final_line_total: Money,

    /// Target currency code, set by the currency stage. Empty when the
    /// pipeline ran without that stage: the amounts are still in the source
    /// currency, unconverted.
    pub currency_code: String,

    /// Whether the currency/rounding stage ran.
    pub rounding_applied: bool,

    /// "Price per unit" display string; empty when the product has no
    /// base-price measurement configured.
    pub base_price_info: String,
}

impl PriceCalculationResult {
    /// An empty accumulator for `product_id`. The currency code stays empty
    /// until the currency stage converts the amounts.
    pub fn new(product_id: ProductId) -> Self {
        PriceCalculationResult {
            product_id,
            regular_price: Money::zero(),
            tier_price: None,
            attribute_adjustment: Money::zero(),
            applied_discounts: Vec::new(),
            discount_total: Money::zero(),
            final_unit_price: Money::zero(),
            final_line_total: Money::zero(),
            currency_code: String::new(),
            rounding_applied: false,
            base_price_info: String::new(),
        }
    }
}

// =============================================================================
// Calculator Stages
// =============================================================================

/// The enumerated calculator stages.
///
/// An explicit, statically typed list of these - not container-discovered
/// magic - is what a pipeline is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculatorStage {
    /// Resolve the base unit price, respecting the special-price window.
    BasePrice,
    /// Apply the best-matching tier price (overrides base when cheaper).
    TierPrice,
    /// Apply selected attribute price adjustments.
    AttributeAdjustments,
    /// Price per-item bundles by their children.
    BundleItems,
    /// Apply eligible discounts.
    Discounts,
    /// Convert to the target currency and apply the rounding policy.
    CurrencyAndRounding,
}

impl CalculatorStage {
    /// Runs this stage against the shared accumulator.
    pub(crate) async fn apply(
        &self,
        ctx: &PricingDataContext,
        request: &PricingRequest,
        result: &mut PriceCalculationResult,
    ) -> EngineResult<()> {
        trace!(stage = ?self, product = %request.product.id, "calculator stage");
        match self {
            CalculatorStage::BasePrice => base_price::apply(ctx, request, result).await,
            CalculatorStage::TierPrice => tier_price::apply(ctx, request, result).await,
            CalculatorStage::AttributeAdjustments => attributes::apply(ctx, request, result).await,
            CalculatorStage::BundleItems => bundle::apply(ctx, request, result).await,
            CalculatorStage::Discounts => discount::apply(ctx, request, result).await,
            CalculatorStage::CurrencyAndRounding => currency::apply(ctx, request, result).await,
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// An ordered, per-use-case list of calculator stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<CalculatorStage>,
}

impl Pipeline {
    /// Builds a pipeline from an explicit stage order.
    pub fn new(stages: Vec<CalculatorStage>) -> EngineResult<Self> {
        if stages.is_empty() {
            return Err(EngineError::EmptyPipeline);
        }
        Ok(Pipeline { stages })
    }

    /// The stages in execution order.
    pub fn stages(&self) -> &[CalculatorStage] {
        &self.stages
    }

    /// Inserts a stage at `index` (feature modules slot extra stages into a
    /// preset this way). Appends when `index` is past the end.
    pub fn insert(&mut self, index: usize, stage: CalculatorStage) {
        let index = index.min(self.stages.len());
        self.stages.insert(index, stage);
    }

    /// Catalog/list pages: no attribute selection exists yet.
    pub fn catalog() -> Self {
        Pipeline {
            stages: vec![
                CalculatorStage::BasePrice,
                CalculatorStage::TierPrice,
                CalculatorStage::BundleItems,
                CalculatorStage::Discounts,
                CalculatorStage::CurrencyAndRounding,
            ],
        }
    }

    /// Cart lines: the full stage order.
    pub fn cart() -> Self {
        Pipeline {
            stages: vec![
                CalculatorStage::BasePrice,
                CalculatorStage::TierPrice,
                CalculatorStage::AttributeAdjustments,
                CalculatorStage::BundleItems,
                CalculatorStage::Discounts,
                CalculatorStage::CurrencyAndRounding,
            ],
        }
    }

    /// Product detail page: currently the same order as the cart, composed
    /// separately so features can diverge the two without touching either.
    pub fn product_page() -> Self {
        Self::cart()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
