//! Daily spend tracking for paid layers.
//!
//! Money is kept as integer micro-dollars in an `AtomicU64`, so concurrent
//! charges from parallel routes add up exactly and never lose an increment.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

use onika_providers::LayerDescriptor;

const MICROS_PER_UNIT: f64 = 1_000_000.0;

fn to_micros(amount: f64) -> u64 {
    if amount.is_finite() && amount > 0.0 {
        (amount * MICROS_PER_UNIT).round() as u64
    } else {
        0
    }
}

fn from_micros(micros: u64) -> f64 {
    micros as f64 / MICROS_PER_UNIT
}

/// Shared budget state. One instance per process, behind an `Arc`.
#[derive(Debug)]
pub struct BudgetTracker {
    daily_limit: u64,
    accrued: AtomicU64,
}

impl BudgetTracker {
    pub fn new(daily_limit: f64) -> Self {
        Self {
            daily_limit: to_micros(daily_limit),
            accrued: AtomicU64::new(0),
        }
    }

    /// Free layers are always eligible; paid layers only while under the limit.
    pub fn is_eligible(&self, layer: &LayerDescriptor) -> bool {
        layer.is_free || self.accrued.load(Ordering::SeqCst) < self.daily_limit
    }

    /// Add `amount` to today's spend. Negative or non-finite amounts are ignored.
    pub fn charge(&self, amount: f64) {
        let micros = to_micros(amount);
        if micros == 0 {
            return;
        }
        let before = self.accrued.fetch_add(micros, Ordering::SeqCst);
        debug!(
            cost = amount,
            accrued = from_micros(before + micros),
            "Budget charged"
        );
    }

    /// Zero today's spend.
    pub fn reset(&self) {
        let before = self.accrued.swap(0, Ordering::SeqCst);
        info!(previous = from_micros(before), "Budget reset");
    }

    pub fn accrued(&self) -> f64 {
        from_micros(self.accrued.load(Ordering::SeqCst))
    }

    pub fn daily_limit(&self) -> f64 {
        from_micros(self.daily_limit)
    }

    /// Headroom left today, floored at zero.
    pub fn remaining(&self) -> f64 {
        from_micros(
            self.daily_limit
                .saturating_sub(self.accrued.load(Ordering::SeqCst)),
        )
    }
}
