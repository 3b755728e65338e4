//! Discount stage.
//!
//! Discounts apply sequentially in the order the facet delivered them; each
//! percentage is computed against the price left by the previous one. That
//! stacking order is this implementation's fixed, documented policy.
//!
//! Eligibility gates, all checked here:
//! - validity window contains the request instant
//! - a required coupon code is present among the caller-verified codes
//! - the externally tracked usage count is below an N-times-per-customer cap
//!
//! The final price never goes negative; an oversized fixed discount is
//! recorded at the reduction it actually achieved.

use pricekit_core::DiscountLimitation;

use crate::calculator::{AppliedDiscount, PriceCalculationResult};
use crate::context::PricingDataContext;
use crate::error::EngineResult;
use crate::request::PricingRequest;

pub(crate) async fn apply(
    ctx: &PricingDataContext,
    request: &PricingRequest,
    result: &mut PriceCalculationResult,
) -> EngineResult<()> {
    if !request.options.include_discounts || !request.product.has_discounts_applied {
        return Ok(());
    }

    let discounts = ctx
        .applied_discounts()
        .await?
        .get(request.product.id)
        .await?;

    for discount in &discounts {
        if !discount.is_active(request.now) {
            continue;
        }
        if let Some(code) = &discount.coupon_code {
            if !request.options.coupon_codes.iter().any(|c| c == code) {
                continue;
            }
        }
        if let DiscountLimitation::NTimesPerCustomer(cap) = discount.limitation {
            let used = request
                .options
                .discount_usage
                .get(&discount.id)
                .copied()
                .unwrap_or(0);
            if used >= cap {
                continue;
            }
        }

        let before = result.final_unit_price;
        let after = (before - discount.amount_off(before)).clamp_non_negative();
        let reduction = before - after;
        if reduction.is_zero() {
            continue;
        }

        result.final_unit_price = after;
        result.discount_total += reduction;
        result.applied_discounts.push(AppliedDiscount {
            discount_id: discount.id,
            amount: reduction,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FetchDelegates;
    use crate::lazy_map::FetchFn;
    use chrono::{Duration, Utc};
    use pricekit_core::{
        Discount, DiscountId, DiscountKind, DiscountScope, Money, Product, ProductId, ProductType,
        StoreId,
    };
    use std::collections::HashMap;
    use std::sync::Arc;

    fn product() -> Product {
        Product {
            id: ProductId(1),
            sku: "SKU-1".into(),
            name: "Widget".into(),
            price: Money::from_cents(8_000),
            special_price: None,
            special_price_start: None,
            special_price_end: None,
            has_tier_prices: false,
            has_discounts_applied: true,
            product_type: ProductType::Simple,
            base_price_amount: None,
            base_price_unit: None,
        }
    }

    fn discount(id: i64, kind: DiscountKind) -> Discount {
        Discount {
            id: DiscountId(id),
            name: format!("Discount {id}"),
            scope: DiscountScope::AssignedToProducts,
            kind,
            valid_from: None,
            valid_until: None,
            coupon_code: None,
            limitation: DiscountLimitation::Unlimited,
        }
    }

    fn discount_fetch(discounts: Vec<Discount>) -> FetchFn<Discount> {
        Arc::new(move |ids| {
            let discounts = discounts.clone();
            Box::pin(async move {
                let mut out = HashMap::new();
                for id in ids {
                    out.insert(id, discounts.clone());
                }
                Ok(out)
            })
        })
    }

    fn context_with(discounts: Vec<Discount>) -> (PricingDataContext, Product) {
        let p = product();
        let delegates = FetchDelegates {
            applied_discounts: Some(discount_fetch(discounts)),
            ..Default::default()
        };
        let ctx =
            PricingDataContext::new(std::slice::from_ref(&p), StoreId::ALL, delegates).unwrap();
        (ctx, p)
    }

    fn result_at(cents: i64) -> PriceCalculationResult {
        let mut result = PriceCalculationResult::new(ProductId(1));
        result.final_unit_price = Money::from_cents(cents);
        result
    }

    #[tokio::test]
    async fn test_percentage_against_running_total() {
        let (ctx, p) = context_with(vec![discount(1, DiscountKind::Percentage(2_000))]);
        let request = crate::request::PricingRequest::new(p, 5, StoreId::ALL, "USD");
        let mut result = result_at(8_000);

        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_unit_price.cents(), 6_400);
        assert_eq!(result.discount_total.cents(), 1_600);
        assert_eq!(result.applied_discounts.len(), 1);
    }

    #[tokio::test]
    async fn test_sequential_stacking() {
        let (ctx, p) = context_with(vec![
            discount(1, DiscountKind::Amount(Money::from_cents(1_000))),
            discount(2, DiscountKind::Percentage(1_000)), // 10% of what's left
        ]);
        let request = crate::request::PricingRequest::new(p, 1, StoreId::ALL, "USD");
        let mut result = result_at(11_000);

        apply(&ctx, &request, &mut result).await.unwrap();
        // 11_000 - 1_000 = 10_000; 10% of 10_000 = 1_000 -> 9_000
        assert_eq!(result.final_unit_price.cents(), 9_000);
        assert_eq!(result.discount_total.cents(), 2_000);
    }

    #[tokio::test]
    async fn test_expired_discount_skipped() {
        let mut d = discount(1, DiscountKind::Percentage(2_000));
        d.valid_until = Some(Utc::now() - Duration::days(1));
        let (ctx, p) = context_with(vec![d]);
        let request = crate::request::PricingRequest::new(p, 1, StoreId::ALL, "USD");
        let mut result = result_at(8_000);

        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_unit_price.cents(), 8_000);
        assert!(result.applied_discounts.is_empty());
    }

    #[tokio::test]
    async fn test_coupon_requirement() {
        let mut d = discount(1, DiscountKind::Percentage(2_000));
        d.coupon_code = Some("SAVE20".into());
        let (ctx, p) = context_with(vec![d]);

        let mut request = crate::request::PricingRequest::new(p, 1, StoreId::ALL, "USD");
        let mut result = result_at(8_000);
        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_unit_price.cents(), 8_000);

        request.options.coupon_codes.push("SAVE20".into());
        let mut result = result_at(8_000);
        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_unit_price.cents(), 6_400);
    }

    #[tokio::test]
    async fn test_usage_limitation() {
        let mut d = discount(1, DiscountKind::Percentage(2_000));
        d.limitation = DiscountLimitation::NTimesPerCustomer(2);
        let (ctx, p) = context_with(vec![d]);

        let mut request = crate::request::PricingRequest::new(p, 1, StoreId::ALL, "USD");
        request.options.discount_usage.insert(DiscountId(1), 2);
        let mut result = result_at(8_000);
        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_unit_price.cents(), 8_000);

        request.options.discount_usage.insert(DiscountId(1), 1);
        let mut result = result_at(8_000);
        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_unit_price.cents(), 6_400);
    }

    #[tokio::test]
    async fn test_oversized_fixed_discount_clamps_at_zero() {
        let (ctx, p) = context_with(vec![discount(
            1,
            DiscountKind::Amount(Money::from_cents(10_000)),
        )]);
        let request = crate::request::PricingRequest::new(p, 1, StoreId::ALL, "USD");
        let mut result = result_at(3_000);

        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_unit_price, Money::zero());
        // recorded at what it actually reduced
        assert_eq!(result.applied_discounts[0].amount.cents(), 3_000);
    }

    #[tokio::test]
    async fn test_exclude_discounts_option() {
        let (ctx, p) = context_with(vec![discount(1, DiscountKind::Percentage(2_000))]);
        let mut request = crate::request::PricingRequest::new(p, 1, StoreId::ALL, "USD");
        request.options.include_discounts = false;
        let mut result = result_at(8_000);

        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_unit_price.cents(), 8_000);
    }
}
