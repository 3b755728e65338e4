//! # PricingService
//!
//! The orchestrator: owns the fetch delegates, builds request-scoped
//! contexts, and drives a caller-composed pipeline over them.
//!
//! ## One Pricing Operation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  caller                                                                 │
//! │    │  create_context(products, store)                                   │
//! │    ▼                                                                    │
//! │  PricingDataContext (classified working set, empty facet maps)          │
//! │    │  calculate(ctx, request, pipeline)                                 │
//! │    ▼                                                                    │
//! │  stage 1 ──► stage 2 ──► ... ──► stage N      (sequential, by design:   │
//! │    │             │                             later stages read the    │
//! │    │   first facet access awaits               earlier stages' result)  │
//! │    │   ONE batched fetch                                                │
//! │    ▼                                                                    │
//! │  PriceCalculationResult (fully populated, or the operation threw)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use pricekit_core::{Product, StoreId};

use crate::calculator::{Pipeline, PriceCalculationResult};
use crate::context::{FetchDelegates, PricingDataContext};
use crate::error::{EngineError, EngineResult};
use crate::request::PricingRequest;

/// Computes final prices by running calculator pipelines over a batched,
/// request-scoped data context.
#[derive(Debug, Clone)]
pub struct PricingService {
    delegates: FetchDelegates,
}

impl PricingService {
    /// Creates a service around the persistence layer's fetch delegates.
    pub fn new(delegates: FetchDelegates) -> Self {
        PricingService { delegates }
    }

    /// Builds a context for one working set of products. Create one per
    /// logical pricing operation (a single product, a list page, a cart).
    pub fn create_context(
        &self,
        products: &[Product],
        store_id: StoreId,
    ) -> EngineResult<PricingDataContext> {
        PricingDataContext::new(products, store_id, self.delegates.clone())
    }

    /// Runs `pipeline` for one request against a shared context.
    ///
    /// Stages execute strictly in order; the calculation either completes
    /// with a fully populated result or returns the first error.
    pub async fn calculate(
        &self,
        ctx: &PricingDataContext,
        request: &PricingRequest,
        pipeline: &Pipeline,
    ) -> EngineResult<PriceCalculationResult> {
        request.validate()?;
        if pipeline.stages().is_empty() {
            return Err(EngineError::EmptyPipeline);
        }
        if request.options.bypass_cache {
            ctx.invalidate().await;
        }

        debug!(
            product = %request.product.id,
            quantity = request.quantity,
            stages = pipeline.stages().len(),
            "price calculation"
        );

        let mut result = PriceCalculationResult::new(request.product.id);
        for stage in pipeline.stages() {
            stage.apply(ctx, request, &mut result).await?;
        }

        // a pipeline without the currency stage still owes the caller a
        // complete result
        if !result.rounding_applied {
            result.final_line_total = result.final_unit_price.multiply_quantity(request.quantity);
        }
        Ok(result)
    }

    /// Prices a batch of requests against one shared context (list pages,
    /// carts, exports). The shared facet maps make this the round-trip-
    /// minimizing path: the first request's facet access batches for the
    /// whole working set. Any failure aborts the batch.
    pub async fn calculate_many(
        &self,
        ctx: &PricingDataContext,
        requests: &[PricingRequest],
        pipeline: &Pipeline,
    ) -> EngineResult<Vec<PriceCalculationResult>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.calculate(ctx, request, pipeline).await?);
        }
        Ok(results)
    }
}
