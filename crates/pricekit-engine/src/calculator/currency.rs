//! Currency and rounding stage, normally the last stage in a pipeline.
//!
//! Converts the accumulated unit price into the target currency and fixes
//! the line total according to the rounding policy:
//!
//! - `BeforeQuantityMultiplication`: convert and round the unit price, then
//!   multiply - the line total is an exact multiple of the displayed unit
//!   price.
//! - `AfterQuantityMultiplication`: multiply the unconverted unit price,
//!   then convert and round once - less cumulative drift on big quantities.
//!
//! Also renders the price-per-unit display string, which short-circuits to
//! empty when the product has no base-price measurement configured.

use pricekit_core::RoundingScope;

use crate::calculator::PriceCalculationResult;
use crate::context::PricingDataContext;
use crate::error::EngineResult;
use crate::request::PricingRequest;

pub(crate) async fn apply(
    _ctx: &PricingDataContext,
    request: &PricingRequest,
    result: &mut PriceCalculationResult,
) -> EngineResult<()> {
    let rate = &request.exchange_rate;
    let converted_unit = result.final_unit_price.convert(rate.rate_micros);

    result.final_line_total = match request.options.rounding.scope {
        RoundingScope::BeforeQuantityMultiplication => {
            converted_unit.multiply_quantity(request.quantity)
        }
        RoundingScope::AfterQuantityMultiplication => result
            .final_unit_price
            .multiply_quantity(request.quantity)
            .convert(rate.rate_micros),
    };
    result.final_unit_price = converted_unit;
    result.currency_code = rate.currency_code.clone();
    result.rounding_applied = true;
    result.base_price_info = request.product.base_price_info(result.final_unit_price);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FetchDelegates;
    use pricekit_core::{ExchangeRate, Money, Product, ProductId, ProductType, StoreId};

    fn product() -> Product {
        Product {
            id: ProductId(1),
            sku: "SKU-1".into(),
            name: "Widget".into(),
            price: Money::from_cents(1_001),
            special_price: None,
            special_price_start: None,
            special_price_end: None,
            has_tier_prices: false,
            has_discounts_applied: false,
            product_type: ProductType::Simple,
            base_price_amount: Some(2),
            base_price_unit: Some("kg".into()),
        }
    }

    fn setup(
        rate_micros: i64,
        quantity: u32,
        scope: RoundingScope,
    ) -> (PricingDataContext, crate::request::PricingRequest) {
        let p = product();
        let ctx =
            PricingDataContext::new(std::slice::from_ref(&p), StoreId::ALL, FetchDelegates::default())
                .unwrap();
        let mut request = crate::request::PricingRequest::new(p, quantity, StoreId::ALL, "EUR");
        request.exchange_rate = ExchangeRate {
            currency_code: "EUR".into(),
            rate_micros,
        };
        request.options.rounding.scope = scope;
        (ctx, request)
    }

    #[tokio::test]
    async fn test_round_before_quantity() {
        // 10.01 at 0.925 -> unit 9.26 (925.925 rounds up); line = 3 x 9.26
        let (ctx, request) =
            setup(925_000, 3, RoundingScope::BeforeQuantityMultiplication);
        let mut result = PriceCalculationResult::new(ProductId(1));
        result.final_unit_price = Money::from_cents(1_001);

        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_unit_price.cents(), 926);
        assert_eq!(result.final_line_total.cents(), 2_778);
        assert!(result.rounding_applied);
        assert_eq!(result.currency_code, "EUR");
    }

    #[tokio::test]
    async fn test_round_after_quantity() {
        // 3 x 10.01 = 30.03 at 0.925 -> 27.78 (2777.775 rounds up)
        let (ctx, request) = setup(925_000, 3, RoundingScope::AfterQuantityMultiplication);
        let mut result = PriceCalculationResult::new(ProductId(1));
        result.final_unit_price = Money::from_cents(1_001);

        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_unit_price.cents(), 926);
        assert_eq!(result.final_line_total.cents(), 2_778);
    }

    #[tokio::test]
    async fn test_scopes_can_differ_by_a_cent() {
        // unit 3.33 at rate 1.0, qty irrelevant for identity; use rate 0.5:
        // before: round(1.665)=1.67 -> x3 = 5.01
        // after:  3 x 3.33 = 9.99 -> round(4.995) = 5.00
        let (ctx, mut request) = setup(500_000, 3, RoundingScope::BeforeQuantityMultiplication);
        let mut result = PriceCalculationResult::new(ProductId(1));
        result.final_unit_price = Money::from_cents(333);
        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_line_total.cents(), 501);

        request.options.rounding.scope = RoundingScope::AfterQuantityMultiplication;
        let mut result = PriceCalculationResult::new(ProductId(1));
        result.final_unit_price = Money::from_cents(333);
        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.final_line_total.cents(), 500);
    }

    #[tokio::test]
    async fn test_base_price_info_rendered() {
        // 2 kg at a converted unit price of 10.00 -> "5.00 / 1 kg"
        let (ctx, request) = setup(1_000_000, 1, RoundingScope::BeforeQuantityMultiplication);
        let mut result = PriceCalculationResult::new(ProductId(1));
        result.final_unit_price = Money::from_cents(1_000);

        apply(&ctx, &request, &mut result).await.unwrap();
        assert_eq!(result.base_price_info, "5.00 / 1 kg");
    }
}
