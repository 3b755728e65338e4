//! # Pricing Request
//!
//! Everything one pricing operation needs as input: the product, quantity,
//! customer, store, target currency and the calculation options.
//!
//! The request is plain data. All lazily fetched facets live in the
//! [`crate::context::PricingDataContext`]; everything externally tracked
//! (coupon codes the caller has verified, discount usage counts) rides along
//! here so the pipeline stages stay pure functions of
//! `(context, request, result-so-far)`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use pricekit_core::{
    AttributeValueId, BundleItemId, Customer, DiscountId, ExchangeRate, Product, RoundingPolicy,
    StoreId, MAX_PURCHASE_QUANTITY,
};
use pricekit_core::{PricingError, PricingResult};

// =============================================================================
// Calculation Options
// =============================================================================

/// Per-request switches for the calculator pipeline.
#[derive(Debug, Clone)]
pub struct CalculationOptions {
    /// Run the discount stage at all.
    pub include_discounts: bool,

    /// Whether the incoming prices already include tax. Tax computation is
    /// external; the flag is carried through to the result untouched.
    pub prices_include_tax: bool,

    /// Drop memoized facet data before calculating, forcing fresh batches.
    pub bypass_cache: bool,

    /// Where conversion rounding happens relative to quantity multiplication.
    pub rounding: RoundingPolicy,

    /// Coupon codes the caller has already verified for this customer.
    /// A discount requiring a code applies only if its code is present here.
    pub coupon_codes: Vec<String>,

    /// Externally tracked per-customer usage counts, consulted by
    /// N-times-per-customer discount limitations.
    pub discount_usage: HashMap<DiscountId, u32>,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        CalculationOptions {
            include_discounts: true,
            prices_include_tax: false,
            bypass_cache: false,
            rounding: RoundingPolicy::default(),
            coupon_codes: Vec::new(),
            discount_usage: HashMap::new(),
        }
    }
}

// =============================================================================
// Pricing Request
// =============================================================================

/// One product-to-price, with its full calculation environment.
#[derive(Debug, Clone)]
pub struct PricingRequest {
    pub product: Product,
    pub quantity: u32,
    pub customer: Option<Customer>,
    pub store_id: StoreId,
    /// Target currency and its rate; identity for the store's own currency.
    pub exchange_rate: ExchangeRate,
    /// The attribute values the customer selected (may be empty).
    pub selected_attribute_values: Vec<AttributeValueId>,
    /// Attribute values selected per bundle item, for bundles whose children
    /// carry their own options. Applied while pricing that item's child.
    pub selected_bundle_attribute_values: HashMap<BundleItemId, Vec<AttributeValueId>>,
    /// The instant window checks (special price, discount validity) run at.
    pub now: DateTime<Utc>,
    pub options: CalculationOptions,
}

impl PricingRequest {
    /// A request with default options, priced "now" at identity rate.
    pub fn new(product: Product, quantity: u32, store_id: StoreId, currency: &str) -> Self {
        PricingRequest {
            product,
            quantity,
            customer: None,
            store_id,
            exchange_rate: ExchangeRate::identity(currency),
            selected_attribute_values: Vec::new(),
            selected_bundle_attribute_values: HashMap::new(),
            now: Utc::now(),
            options: CalculationOptions::default(),
        }
    }

    /// Fail-fast contract checks, run once by the orchestrator before any
    /// stage executes.
    pub fn validate(&self) -> PricingResult<()> {
        if self.quantity == 0 || self.quantity > MAX_PURCHASE_QUANTITY {
            return Err(PricingError::InvalidQuantity {
                requested: self.quantity,
                max: MAX_PURCHASE_QUANTITY,
            });
        }
        if self.exchange_rate.rate_micros <= 0 {
            return Err(PricingError::InvalidExchangeRate {
                currency: self.exchange_rate.currency_code.clone(),
                rate_micros: self.exchange_rate.rate_micros,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pricekit_core::{Money, ProductId, ProductType};

    fn product() -> Product {
        Product {
            id: ProductId(1),
            sku: "SKU-1".into(),
            name: "Widget".into(),
            price: Money::from_cents(1_000),
            special_price: None,
            special_price_start: None,
            special_price_end: None,
            has_tier_prices: false,
            has_discounts_applied: false,
            product_type: ProductType::Simple,
            base_price_amount: None,
            base_price_unit: None,
        }
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let request = PricingRequest::new(product(), 0, StoreId::ALL, "USD");
        assert!(matches!(
            request.validate(),
            Err(PricingError::InvalidQuantity { requested: 0, .. })
        ));
    }

    #[test]
    fn test_nonpositive_rate_rejected() {
        let mut request = PricingRequest::new(product(), 1, StoreId::ALL, "USD");
        request.exchange_rate.rate_micros = 0;
        assert!(matches!(
            request.validate(),
            Err(PricingError::InvalidExchangeRate { .. })
        ));
    }

    #[test]
    fn test_valid_request_passes() {
        let request = PricingRequest::new(product(), 3, StoreId(5), "USD");
        assert!(request.validate().is_ok());
    }
}
