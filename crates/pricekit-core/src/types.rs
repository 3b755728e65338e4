//! # Domain Types
//!
//! Core domain types used throughout PriceKit.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    TierPrice    │   │    Discount     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, sku        │   │  product_id     │   │  id, scope      │       │
//! │  │  price          │   │  quantity (min) │   │  kind (% / amt) │       │
//! │  │  special window │   │  customer_role  │   │  validity window│       │
//! │  │  facet flags    │   │  store_id       │   │  limitation     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐   ┌──────────────┐    │
//! │  │   BundleItem    │   │ AttributePricingItem │   │   Customer   │    │
//! │  │  parent, child  │   │ selected values with │   │ active roles │    │
//! │  │  per-item flag  │   │ price adjustments    │   │              │    │
//! │  └─────────────────┘   └──────────────────────┘   └──────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All entities use integer ids, matching the `(ids) -> map` shape of the
//! batched fetch delegates the persistence layer supplies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Identifier Newtypes
// =============================================================================

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Stable product identifier.
    ProductId
);
id_newtype!(
    /// Store identifier. `StoreId(0)` means "all stores".
    StoreId
);
id_newtype!(
    /// Customer role identifier (tier price eligibility gates on these).
    RoleId
);
id_newtype!(
    /// Discount identifier.
    DiscountId
);
id_newtype!(
    /// Customer identifier.
    CustomerId
);
id_newtype!(
    /// Category identifier (category-scoped discount eligibility).
    CategoryId
);
id_newtype!(
    /// Manufacturer identifier.
    ManufacturerId
);
id_newtype!(
    /// Selected attribute value identifier (color = red, size = XL, ...).
    AttributeValueId
);
id_newtype!(
    /// Bundle item identifier. Attribute pricing entries and per-item
    /// attribute selections scope to these.
    BundleItemId
);

impl StoreId {
    /// The "all stores" scope marker.
    pub const ALL: StoreId = StoreId(0);

    /// Whether this id means "applies to every store".
    #[inline]
    pub const fn is_global(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Product
// =============================================================================

/// How a product composes with other products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// A plain standalone product.
    Simple,
    /// A parent composed of [`BundleItem`] children.
    Bundled,
    /// A parent whose associated products are sold individually.
    Grouped,
    /// A variant of another product.
    Variant,
}

impl Default for ProductType {
    fn default() -> Self {
        ProductType::Simple
    }
}

/// A catalog product, restricted to its pricing-relevant fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Stable identifier.
    pub id: ProductId,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name (used in logs and the price-per-unit string).
    pub name: String,

    /// Regular unit price.
    pub price: Money,

    /// Optional promotional price, only active inside its window.
    pub special_price: Option<Money>,

    /// Start of the special-price window (None = open start).
    pub special_price_start: Option<DateTime<Utc>>,

    /// End of the special-price window (None = open end).
    pub special_price_end: Option<DateTime<Utc>>,

    /// Whether any tier prices exist for this product. The data context uses
    /// this to avoid ever querying the tier-price facet for products without.
    pub has_tier_prices: bool,

    /// Whether any discounts are assigned to this product. Same role as
    /// `has_tier_prices` for the applied-discounts facet.
    pub has_discounts_applied: bool,

    /// Composition type.
    pub product_type: ProductType,

    /// Measurement amount contained in one sale unit, for "price per kg"
    /// style display (e.g. 2 for a 2 kg bag). None or zero disables it.
    pub base_price_amount: Option<u32>,

    /// Measurement unit for the display string (e.g. "kg").
    pub base_price_unit: Option<String>,
}

impl Product {
    /// Whether the special price is active at `now`.
    pub fn special_price_active(&self, now: DateTime<Utc>) -> bool {
        if self.special_price.is_none() {
            return false;
        }
        if let Some(start) = self.special_price_start {
            if now < start {
                return false;
            }
        }
        if let Some(end) = self.special_price_end {
            if now > end {
                return false;
            }
        }
        true
    }

    /// The unit price before any tier/attribute/discount adjustment: the
    /// special price when its window is active, the regular price otherwise.
    pub fn effective_base_price(&self, now: DateTime<Utc>) -> Money {
        if self.special_price_active(now) {
            // special_price checked by special_price_active
            self.special_price.unwrap_or(self.price)
        } else {
            self.price
        }
    }

    /// Renders the "price per unit" display string for a final price, e.g.
    /// `"5.00 / 1 kg"` for a 2 kg bag priced at 10.00.
    ///
    /// Short-circuits to an empty string when the base-price amount is unset
    /// or zero, or no unit is configured.
    pub fn base_price_info(&self, final_price: Money) -> String {
        let amount = match self.base_price_amount {
            Some(a) if a > 0 => a,
            _ => return String::new(),
        };
        let unit = match &self.base_price_unit {
            Some(u) if !u.is_empty() => u,
            _ => return String::new(),
        };
        let per_unit = Money::from_cents(
            ((final_price.cents() as i128 + (amount as i128 / 2)) / amount as i128) as i64,
        );
        format!("{} / 1 {}", per_unit, unit)
    }
}

// =============================================================================
// Tier Price
// =============================================================================

/// A quantity-threshold price override.
///
/// Once the purchase quantity reaches `quantity`, `price` replaces the unit
/// price (when cheaper). Eligibility is gated by store scope and, optionally,
/// a customer role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierPrice {
    pub product_id: ProductId,
    /// Minimum purchase quantity for this tier to apply.
    pub quantity: u32,
    pub price: Money,
    /// None = eligible for every customer.
    pub customer_role: Option<RoleId>,
    /// `StoreId::ALL` = eligible in every store.
    pub store_id: StoreId,
}

// =============================================================================
// Discount
// =============================================================================

/// What a discount is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountScope {
    AssignedToProducts,
    AssignedToCategories,
    AssignedToManufacturers,
    AssignedToSkus,
    AssignedToOrderTotal,
}

/// Percentage (basis points) or fixed-amount reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Percentage of the running price, in basis points (2000 = 20%).
    Percentage(u32),
    /// Fixed amount off.
    Amount(Money),
}

/// How often one customer may use a discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountLimitation {
    Unlimited,
    /// At most N uses per customer; usage counts are tracked externally and
    /// passed into the calculation options.
    NTimesPerCustomer(u32),
}

impl Default for DiscountLimitation {
    fn default() -> Self {
        DiscountLimitation::Unlimited
    }
}

/// A percentage or fixed-amount price reduction, optionally gated by a date
/// window, a coupon code and a usage limitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    pub name: String,
    pub scope: DiscountScope,
    pub kind: DiscountKind,
    /// Start of validity (None = open start).
    pub valid_from: Option<DateTime<Utc>>,
    /// End of validity (None = open end).
    pub valid_until: Option<DateTime<Utc>>,
    /// When set, the request must carry this coupon code (the caller verifies
    /// the code itself; the pipeline only checks presence).
    pub coupon_code: Option<String>,
    pub limitation: DiscountLimitation,
}

impl Discount {
    /// Whether the validity window contains `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        if let Some(from) = self.valid_from {
            if now < from {
                return false;
            }
        }
        if let Some(until) = self.valid_until {
            if now > until {
                return false;
            }
        }
        true
    }

    /// The reduction this discount takes off `base`.
    ///
    /// Percentages are computed against `base` (the running price at the
    /// moment the discount applies); fixed amounts ignore it.
    pub fn amount_off(&self, base: Money) -> Money {
        match self.kind {
            DiscountKind::Percentage(bps) => base.percentage(bps),
            DiscountKind::Amount(amount) => amount,
        }
    }
}

// =============================================================================
// Bundle Item
// =============================================================================

/// A child product composed into a parent "bundle" product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleItem {
    pub id: BundleItemId,
    pub parent_product_id: ProductId,
    pub child_product_id: ProductId,
    /// How many of the child one bundle contains.
    pub quantity: u32,
    /// true: the bundle price sums its individually priced children.
    /// false: the bundle's own resolved price stands.
    pub per_item_pricing: bool,
}

// =============================================================================
// Attribute Pricing
// =============================================================================

/// Additive amount or percentage carried by a selected attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceAdjustment {
    /// Add a fixed amount.
    Fixed(Money),
    /// Add a percentage (bps) of the running price.
    Percentage(u32),
}

/// One selectable attribute value with its price adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValuePrice {
    pub value_id: AttributeValueId,
    pub adjustment: PriceAdjustment,
}

/// The priced attribute values of a product.
///
/// An entry with `bundle_item_id` set applies only when the product is priced
/// as that bundle item's child; entries without it price the product's own
/// selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributePricingItem {
    pub product_id: ProductId,
    pub bundle_item_id: Option<BundleItemId>,
    pub values: Vec<AttributeValuePrice>,
}

/// A concrete combination of attribute values that may override the unit
/// price outright (e.g. "red + XL" has its own price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeCombination {
    pub product_id: ProductId,
    /// The exact value set this combination matches.
    pub value_ids: Vec<AttributeValueId>,
    /// When set, replaces the unit price for a matching selection.
    pub price_override: Option<Money>,
}

impl AttributeCombination {
    /// Whether `selected` is exactly this combination (order-insensitive).
    pub fn matches(&self, selected: &[AttributeValueId]) -> bool {
        if self.value_ids.len() != selected.len() {
            return false;
        }
        self.value_ids.iter().all(|v| selected.contains(v))
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer role (tier prices may require one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRole {
    pub id: RoleId,
    pub name: String,
    pub active: bool,
}

/// The customer a price is computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub roles: Vec<CustomerRole>,
}

impl Customer {
    /// Whether the customer holds `role` in active state.
    pub fn has_active_role(&self, role: RoleId) -> bool {
        self.roles.iter().any(|r| r.active && r.id == role)
    }

    /// Whether the customer holds any active role at all.
    pub fn has_any_active_role(&self) -> bool {
        self.roles.iter().any(|r| r.active)
    }
}

// =============================================================================
// Currency & Rounding
// =============================================================================

/// An exchange rate into a target currency.
///
/// The rate is integer micro-units (1_000_000 = 1.0) so conversion stays in
/// integer math. Rate retrieval is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub currency_code: String,
    pub rate_micros: i64,
}

impl ExchangeRate {
    /// The identity rate (no conversion).
    pub fn identity(currency_code: impl Into<String>) -> Self {
        ExchangeRate {
            currency_code: currency_code.into(),
            rate_micros: 1_000_000,
        }
    }

    /// Whether converting with this rate is a no-op.
    pub fn is_identity(&self) -> bool {
        self.rate_micros == 1_000_000
    }
}

/// Where quantity multiplication happens relative to conversion rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingScope {
    /// Convert and round the unit price first, then multiply by quantity.
    /// Line totals are always an exact multiple of the displayed unit price.
    BeforeQuantityMultiplication,
    /// Multiply first, then convert and round the line total once. Minimizes
    /// cumulative rounding drift on large quantities.
    AfterQuantityMultiplication,
}

impl Default for RoundingScope {
    fn default() -> Self {
        RoundingScope::BeforeQuantityMultiplication
    }
}

/// The configured rounding behavior of the currency stage.
///
/// Only the quantity-multiplication scope is modeled. Net versus gross
/// rounding is deliberately absent: tax computation happens outside the
/// pipeline, so amounts pass through on a single basis and the
/// prices-include-tax flag is carried untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundingPolicy {
    pub scope: RoundingScope,
}

// =============================================================================
// Unit Tests
// =============================================================================
