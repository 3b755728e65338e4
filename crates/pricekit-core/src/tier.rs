//! # Tier Price Resolver
//!
//! Pure filtering, deduplication and selection of tier prices.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tier Price Resolution                               │
//! │                                                                         │
//! │  all tier prices of the product                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  filter_by_store(store)        keep global + this store                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  filter_for_customer(customer) keep role-less + matching-role entries   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  remove_duplicated_quantities  one minimum-price entry per quantity     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  best tier: largest quantity <= purchase quantity                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `remove_duplicated_quantities` deliberately mutates its input in place and
//! returns it, so callers can chain it over an owned working vector without a
//! second allocation. This mutate-and-return contract is part of the API.

use std::collections::HashMap;

use crate::types::{Customer, StoreId, TierPrice};

// =============================================================================
// Store Filtering
// =============================================================================

/// Keeps tier prices eligible in `store_id`.
///
/// - `StoreId::ALL` (0): only globally scoped entries remain.
/// - Any other store: globally scoped entries plus that store's entries.
pub fn filter_by_store(source: &[TierPrice], store_id: StoreId) -> Vec<TierPrice> {
    source
        .iter()
        .filter(|tp| tp.store_id.is_global() || (!store_id.is_global() && tp.store_id == store_id))
        .cloned()
        .collect()
}

// =============================================================================
// Customer Filtering
// =============================================================================

/// Lazily yields the tier prices eligible for `customer`.
///
/// An entry without a customer role is yielded unconditionally. An entry with
/// a role requires a customer holding at least one active role, one of which
/// matches. The returned iterator borrows `source`, so it can be restarted by
/// calling this function again.
pub fn filter_for_customer<'a>(
    source: &'a [TierPrice],
    customer: Option<&'a Customer>,
) -> impl Iterator<Item = &'a TierPrice> + 'a {
    source.iter().filter(move |tp| match tp.customer_role {
        None => true,
        Some(role) => customer
            .map(|c| c.has_any_active_role() && c.has_active_role(role))
            .unwrap_or(false),
    })
}

// =============================================================================
// Quantity Deduplication
// =============================================================================

/// Collapses entries sharing a quantity threshold down to the cheapest one.
///
/// For any quantity with more than one entry, only the entry with the minimum
/// price survives; the others are removed from `source` in place. Returns the
/// same collection for chaining. Relative order of survivors is preserved.
pub fn remove_duplicated_quantities(source: &mut Vec<TierPrice>) -> &mut Vec<TierPrice> {
    // quantity -> index of the cheapest entry seen so far
    let mut cheapest: HashMap<u32, usize> = HashMap::new();
    for (idx, tp) in source.iter().enumerate() {
        match cheapest.get(&tp.quantity) {
            Some(&best) if source[best].price <= tp.price => {}
            _ => {
                cheapest.insert(tp.quantity, idx);
            }
        }
    }

    let mut idx = 0;
    source.retain(|tp| {
        let keep = cheapest.get(&tp.quantity) == Some(&idx);
        idx += 1;
        keep
    });
    source
}

// =============================================================================
// Selection
// =============================================================================

/// Picks the best-matching tier price for a purchase of `quantity` units.
///
/// Applies store and customer filtering plus deduplication, then selects the
/// tier with the largest threshold not exceeding `quantity`. Returns None
/// when no tier qualifies (caller falls back to the regular price).
pub fn select_tier_price(
    source: &[TierPrice],
    store_id: StoreId,
    customer: Option<&Customer>,
    quantity: u32,
) -> Option<TierPrice> {
    let store_scoped = filter_by_store(source, store_id);
    let mut eligible: Vec<TierPrice> = filter_for_customer(&store_scoped, customer)
        .cloned()
        .collect();
    remove_duplicated_quantities(&mut eligible);

    eligible
        .into_iter()
        .filter(|tp| tp.quantity <= quantity)
        .max_by_key(|tp| tp.quantity)
}

// =============================================================================
// Unit Tests
// =============================================================================
