//! Bundle stage.
//!
//! A bundle whose items all carry `per_item_pricing` is priced as the
//! quantity-weighted sum of its individually priced children. Any item
//! without the flag means the bundle's own resolved price (stages 1-3)
//! stands for the whole bundle.
//!
//! Child pricing recurses: base price, tier override, attribute adjustments
//! selected for the bundle item, and - for a child that is itself a per-item
//! bundle - the sum of its own children, bounded by [`MAX_BUNDLE_DEPTH`].

use futures::future::BoxFuture;

use pricekit_core::{
    tier, BundleItem, Money, PriceAdjustment, PricingError, Product, ProductType,
    MAX_BUNDLE_DEPTH,
};

use crate::calculator::PriceCalculationResult;
use crate::context::PricingDataContext;
use crate::error::{EngineError, EngineResult};
use crate::request::PricingRequest;

pub(crate) async fn apply(
    ctx: &PricingDataContext,
    request: &PricingRequest,
    result: &mut PriceCalculationResult,
) -> EngineResult<()> {
    if request.product.product_type != ProductType::Bundled {
        return Ok(());
    }

    let total = match per_item_total(ctx, request, request.product.id, 1).await? {
        Some(total) => total,
        // fixed-price bundle: the price resolved so far stands
        None => return Ok(()),
    };
    result.final_unit_price = total;
    Ok(())
}

/// Sums the per-item-priced children of `parent_id`, or returns None when the
/// bundle is fixed-price (no items, or any item without the per-item flag).
fn per_item_total<'a>(
    ctx: &'a PricingDataContext,
    request: &'a PricingRequest,
    parent_id: pricekit_core::ProductId,
    depth: u32,
) -> BoxFuture<'a, EngineResult<Option<Money>>> {
    Box::pin(async move {
        if depth > MAX_BUNDLE_DEPTH {
            return Err(PricingError::BundleTooDeep {
                product_id: parent_id,
                max: MAX_BUNDLE_DEPTH,
            }
            .into());
        }

        let items = ctx.bundle_items().await?.get(parent_id).await?;
        if items.is_empty() || items.iter().any(|i| !i.per_item_pricing) {
            return Ok(None);
        }

        let children = ctx.associated_products().await?.get(parent_id).await?;
        // drill-down: the children join the working set so every facet
        // extends in one coordinated step
        let child_ids: Vec<_> = items.iter().map(|i| i.child_product_id).collect();
        ctx.collect(&child_ids).await;

        let mut total = Money::zero();
        for item in &items {
            let child = children
                .iter()
                .find(|c| c.id == item.child_product_id)
                .ok_or(EngineError::BundleChildNotFound {
                    parent_id,
                    child_id: item.child_product_id,
                })?;
            let unit = child_unit_price(ctx, request, item, child, depth).await?;
            total += unit.multiply_quantity(item.quantity);
        }
        Ok(Some(total))
    })
}

/// Resolves one child's unit price: base (special window respected), tier
/// override for the item's quantity, attribute adjustments selected for this
/// bundle item, and - when the child is itself a per-item bundle - the
/// recursive sum of its children.
async fn child_unit_price(
    ctx: &PricingDataContext,
    request: &PricingRequest,
    item: &BundleItem,
    child: &Product,
    depth: u32,
) -> EngineResult<Money> {
    let mut unit = child.effective_base_price(request.now);

    if child.has_tier_prices {
        let tiers = ctx.tier_prices().await?.get(child.id).await?;
        if let Some(tp) = tier::select_tier_price(
            &tiers,
            request.store_id,
            request.customer.as_ref(),
            item.quantity,
        ) {
            unit = unit.min(tp.price);
        }
    }

    // per-item attribute selections apply to the child the same way the
    // attribute stage applies the product's own selection
    if let Some(selected) = request.selected_bundle_attribute_values.get(&item.id) {
        if !selected.is_empty() {
            let priced = ctx.attributes().await?.get(child.id).await?;
            for entry in priced.iter().filter(|e| e.bundle_item_id == Some(item.id)) {
                for value in &entry.values {
                    if !selected.contains(&value.value_id) {
                        continue;
                    }
                    unit += match value.adjustment {
                        PriceAdjustment::Fixed(amount) => amount,
                        PriceAdjustment::Percentage(bps) => unit.percentage(bps),
                    };
                }
            }
        }
    }

    if child.product_type == ProductType::Bundled {
        if let Some(total) = per_item_total(ctx, request, child.id, depth + 1).await? {
            unit = total;
        }
    }

    Ok(unit)
}
