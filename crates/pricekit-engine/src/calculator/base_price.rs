//! Base price stage: resolves the unit price the rest of the pipeline starts
//! from, honoring an active special-price window.

use crate::calculator::PriceCalculationResult;
use crate::context::PricingDataContext;
use crate::error::EngineResult;
use crate::request::PricingRequest;

pub(crate) async fn apply(
    _ctx: &PricingDataContext,
    request: &PricingRequest,
    result: &mut PriceCalculationResult,
) -> EngineResult<()> {
    let base = request.product.effective_base_price(request.now);
    result.regular_price = base;
    result.final_unit_price = base;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FetchDelegates;
    use chrono::{Duration, Utc};
    use pricekit_core::{Money, Product, ProductId, ProductType, StoreId};

    fn product() -> Product {
        Product {
            id: ProductId(1),
            sku: "SKU-1".into(),
            name: "Widget".into(),
            price: Money::from_cents(10_000),
            special_price: Some(Money::from_cents(8_500)),
            special_price_start: Some(Utc::now() - Duration::days(1)),
            special_price_end: Some(Utc::now() + Duration::days(1)),
            has_tier_prices: false,
            has_discounts_applied: false,
            product_type: ProductType::Simple,
            base_price_amount: None,
            base_price_unit: None,
        }
    }

    #[tokio::test]
    async fn test_active_special_price_wins() {
        let p = product();
        let ctx =
            PricingDataContext::new(std::slice::from_ref(&p), StoreId::ALL, FetchDelegates::default())
                .unwrap();
        let request = crate::request::PricingRequest::new(p, 1, StoreId::ALL, "USD");
        let mut result = PriceCalculationResult::new(ProductId(1));

        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.regular_price.cents(), 8_500);
        assert_eq!(result.final_unit_price.cents(), 8_500);
    }

    #[tokio::test]
    async fn test_expired_special_price_ignored() {
        let mut p = product();
        p.special_price_end = Some(Utc::now() - Duration::hours(1));
        let ctx =
            PricingDataContext::new(std::slice::from_ref(&p), StoreId::ALL, FetchDelegates::default())
                .unwrap();
        let request = crate::request::PricingRequest::new(p, 1, StoreId::ALL, "USD");
        let mut result = PriceCalculationResult::new(ProductId(1));

        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_unit_price.cents(), 10_000);
    }
}
