//! # Reentrancy Guard
//!
//! Keyed mutual exclusion for the two monetary rules (cart subtotal / cart
//! total) that can recurse into themselves.
//!
//! ## Why This Exists
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE RECURSION TRAP                                                     │
//! │                                                                         │
//! │  "cart subtotal ≥ X?" rule                                              │
//! │       │ needs the uncached subtotal                                     │
//! │       ▼                                                                 │
//! │  recompute subtotal                                                     │
//! │       │ which discounts apply?                                          │
//! │       ▼                                                                 │
//! │  "cart subtotal ≥ X?" rule  ← SAME RULE, SAME SESSION                  │
//! │       │                                                                 │
//! │      ∞ ...                                                              │
//! │                                                                         │
//! │  THE GUARD: the inner evaluation finds its key already held and         │
//! │  returns "no match" immediately. No wait. No deadlock. Deterministic    │
//! │  conservative answer during the recursive window.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The registry is an explicit piece of request-scoped state handed to the
//! rule evaluators - no ambient globals - so every test can construct an
//! independent registry.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::trace;
use uuid::Uuid;

use pricekit_core::Money;

use crate::error::EngineResult;

// =============================================================================
// Rule Kind & Registry
// =============================================================================

/// The reentrancy-sensitive monetary rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    CartSubtotal,
    CartTotal,
}

type Key = (RuleKind, Uuid);

/// Tracks which `(rule kind, session)` evaluations are currently in flight.
///
/// Cheap to clone (shared interior); create one per request scope.
#[derive(Clone, Default)]
pub struct ReentrancyRegistry {
    in_flight: Arc<Mutex<HashSet<Key>>>,
}

impl ReentrancyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to mark `(kind, session)` as in flight. Returns `None` when
    /// the key is already held - the caller must answer "no match" without
    /// waiting. The returned guard releases the key on drop.
    pub fn try_enter(&self, kind: RuleKind, session: Uuid) -> Option<ReentrancyGuard> {
        let mut held = self.lock();
        if held.contains(&(kind, session)) {
            trace!(?kind, %session, "reentrant rule evaluation, answering no-match");
            return None;
        }
        held.insert((kind, session));
        Some(ReentrancyGuard {
            registry: self.in_flight.clone(),
            key: (kind, session),
        })
    }

    /// Whether the key is currently held (test/diagnostic visibility).
    pub fn is_held(&self, kind: RuleKind, session: Uuid) -> bool {
        self.lock().contains(&(kind, session))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<Key>> {
        // A poisoned lock only means a rule evaluation panicked mid-flight;
        // the set itself is still a valid set of keys.
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for ReentrancyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReentrancyRegistry")
            .field("in_flight", &self.lock().len())
            .finish()
    }
}

/// RAII guard for one in-flight rule evaluation.
pub struct ReentrancyGuard {
    registry: Arc<Mutex<HashSet<Key>>>,
    key: Key,
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

// =============================================================================
// Monetary Rules
// =============================================================================

/// A "cart amount ≥ threshold" rule over the uncached subtotal or total.
///
/// The amount computation is injected because it recurses into pricing (that
/// recursion is exactly what the registry defuses).
#[derive(Debug, Clone)]
pub struct CartValueRule {
    pub kind: RuleKind,
    pub min_amount: Money,
}

impl CartValueRule {
    pub fn new(kind: RuleKind, min_amount: Money) -> Self {
        CartValueRule { kind, min_amount }
    }

    /// Evaluates the rule for one session.
    ///
    /// A reentrant evaluation (the same kind + session already mid-flight)
    /// resolves to `Ok(false)` - "no match" - by design, not an error. The
    /// guard is held across the whole `compute_amount` await so any nested
    /// evaluation inside it sees the key.
    pub async fn evaluate<F, Fut>(
        &self,
        registry: &ReentrancyRegistry,
        session: Uuid,
        compute_amount: F,
    ) -> EngineResult<bool>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = EngineResult<Money>>,
    {
        let _guard = match registry.try_enter(self.kind, session) {
            Some(guard) => guard,
            None => return Ok(false),
        };

        let amount = compute_amount().await?;
        Ok(amount >= self.min_amount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
