//! Tier price stage: selects the best-matching tier for the requested
//! quantity and overrides the unit price when the tier is cheaper.
//!
//! Products without the `has_tier_prices` flag never touch the tier facet at
//! all, so the batched fetch never sees their ids.

use pricekit_core::tier;

use crate::calculator::PriceCalculationResult;
use crate::context::PricingDataContext;
use crate::error::EngineResult;
use crate::request::PricingRequest;

pub(crate) async fn apply(
    ctx: &PricingDataContext,
    request: &PricingRequest,
    result: &mut PriceCalculationResult,
) -> EngineResult<()> {
    if !request.product.has_tier_prices {
        return Ok(());
    }

    let tiers = ctx.tier_prices().await?.get(request.product.id).await?;
    let selected = tier::select_tier_price(
        &tiers,
        request.store_id,
        request.customer.as_ref(),
        request.quantity,
    );

    if let Some(tp) = selected {
        if tp.price < result.final_unit_price {
            result.final_unit_price = tp.price;
            result.tier_price = Some(tp.price);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FetchDelegates;
    use crate::lazy_map::FetchFn;
    use pricekit_core::{Money, Product, ProductId, ProductType, StoreId, TierPrice};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn product(has_tier_prices: bool) -> Product {
        Product {
            id: ProductId(1),
            sku: "SKU-1".into(),
            name: "Widget".into(),
            price: Money::from_cents(10_000),
            special_price: None,
            special_price_start: None,
            special_price_end: None,
            has_tier_prices,
            has_discounts_applied: false,
            product_type: ProductType::Simple,
            base_price_amount: None,
            base_price_unit: None,
        }
    }

    fn tier_fetch(tiers: Vec<TierPrice>, calls: Arc<AtomicUsize>) -> FetchFn<TierPrice> {
        Arc::new(move |ids| {
            let tiers = tiers.clone();
            let calls = calls.clone();
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let mut out: HashMap<ProductId, Vec<TierPrice>> = HashMap::new();
                for id in ids {
                    out.insert(
                        id,
                        tiers.iter().filter(|t| t.product_id == id).cloned().collect(),
                    );
                }
                Ok(out)
            })
        })
    }

    fn tier(quantity: u32, price_cents: i64) -> TierPrice {
        TierPrice {
            product_id: ProductId(1),
            quantity,
            price: Money::from_cents(price_cents),
            customer_role: None,
            store_id: StoreId::ALL,
        }
    }

    #[tokio::test]
    async fn test_cheaper_tier_overrides_base() {
        let calls = Arc::new(AtomicUsize::new(0));
        let delegates = FetchDelegates {
            tier_prices: Some(tier_fetch(vec![tier(5, 8_000)], calls.clone())),
            ..Default::default()
        };
        let p = product(true);
        let ctx = PricingDataContext::new(std::slice::from_ref(&p), StoreId::ALL, delegates).unwrap();
        let request = crate::request::PricingRequest::new(p, 5, StoreId::ALL, "USD");
        let mut result = PriceCalculationResult::new(ProductId(1));
        result.final_unit_price = Money::from_cents(10_000);

        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_unit_price.cents(), 8_000);
        assert_eq!(result.tier_price, Some(Money::from_cents(8_000)));
    }

    #[tokio::test]
    async fn test_more_expensive_tier_is_ignored() {
        let calls = Arc::new(AtomicUsize::new(0));
        let delegates = FetchDelegates {
            tier_prices: Some(tier_fetch(vec![tier(5, 12_000)], calls.clone())),
            ..Default::default()
        };
        let p = product(true);
        let ctx = PricingDataContext::new(std::slice::from_ref(&p), StoreId::ALL, delegates).unwrap();
        let request = crate::request::PricingRequest::new(p, 5, StoreId::ALL, "USD");
        let mut result = PriceCalculationResult::new(ProductId(1));
        result.final_unit_price = Money::from_cents(10_000);

        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_unit_price.cents(), 10_000);
        assert!(result.tier_price.is_none());
    }

    #[tokio::test]
    async fn test_flagless_product_never_fetches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let delegates = FetchDelegates {
            tier_prices: Some(tier_fetch(vec![], calls.clone())),
            ..Default::default()
        };
        let p = product(false);
        let ctx = PricingDataContext::new(std::slice::from_ref(&p), StoreId::ALL, delegates).unwrap();
        let request = crate::request::PricingRequest::new(p, 5, StoreId::ALL, "USD");
        let mut result = PriceCalculationResult::new(ProductId(1));
        result.final_unit_price = Money::from_cents(10_000);

        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
