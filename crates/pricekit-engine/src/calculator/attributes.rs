//! Attribute adjustment stage.
//!
//! A combination with its own price override wins outright (the combination
//! price already prices the whole selection). Otherwise each selected value's
//! adjustment applies in turn: fixed amounts add, percentages are computed
//! against the running total at the moment they apply.

use pricekit_core::{Money, PriceAdjustment};

use crate::calculator::PriceCalculationResult;
use crate::context::PricingDataContext;
use crate::error::EngineResult;
use crate::request::PricingRequest;

pub(crate) async fn apply(
    ctx: &PricingDataContext,
    request: &PricingRequest,
    result: &mut PriceCalculationResult,
) -> EngineResult<()> {
    if request.selected_attribute_values.is_empty() {
        return Ok(());
    }

    // A matching combination with a price override replaces the unit price.
    let combinations = ctx
        .attribute_combinations()
        .await?
        .get(request.product.id)
        .await?;
    if let Some(combo) = combinations
        .iter()
        .find(|c| c.matches(&request.selected_attribute_values))
    {
        if let Some(price) = combo.price_override {
            result.final_unit_price = price;
            return Ok(());
        }
    }

    let items = ctx.attributes().await?.get(request.product.id).await?;
    let mut adjustment_total = Money::zero();
    for item in items.iter().filter(|i| i.bundle_item_id.is_none()) {
        for value in &item.values {
            if !request.selected_attribute_values.contains(&value.value_id) {
                continue;
            }
            let delta = match value.adjustment {
                PriceAdjustment::Fixed(amount) => amount,
                PriceAdjustment::Percentage(bps) => result.final_unit_price.percentage(bps),
            };
            result.final_unit_price += delta;
            adjustment_total += delta;
        }
    }
    result.attribute_adjustment = adjustment_total;
    Ok(())
}
