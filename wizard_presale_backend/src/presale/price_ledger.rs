use candid::{CandidType, Deserialize};

use crate::types::{Affinity, Cycles, INCREMENT_DENOMINATOR, SCALE};

// =============================================================================
// CONVERSIONS
// =============================================================================

/// Floor division: any cost below a whole unit of power is lost.
pub fn cost_to_power(cost: Cycles) -> u128 {
    cost / SCALE
}

/// Exact inverse of `cost_to_power` for every valid power (< 2^88 never overflows).
pub fn power_to_cost(power: u128) -> Cycles {
    power.saturating_mul(SCALE)
}

/// `c + floor(c * rate / 100_000)`, saturating at `u128::MAX`.
///
/// Splits `c` around the denominator so the product only overflows when the
/// true result would not fit anyway.
pub fn next_elemental_cost(current: Cycles, increment_rate: u128) -> Cycles {
    let whole = (current / INCREMENT_DENOMINATOR).checked_mul(increment_rate);
    let part = (current % INCREMENT_DENOMINATOR)
        .checked_mul(increment_rate)
        .map(|p| p / INCREMENT_DENOMINATOR);

    whole
        .zip(part)
        .and_then(|(w, p)| w.checked_add(p))
        .and_then(|increment| current.checked_add(increment))
        .unwrap_or(Cycles::MAX)
}

// =============================================================================
// PRICE CURSOR
// =============================================================================

/// Current prices. Neutral never moves; elemental only climbs.
#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PriceLedger {
    pub(crate) neutral_cost: Cycles,
    pub(crate) elemental_cost: Cycles,
    pub(crate) increment_rate: u128,
}

impl PriceLedger {
    pub fn new(starting_cost: Cycles, increment_rate: u128) -> Self {
        Self {
            neutral_cost: starting_cost,
            elemental_cost: starting_cost,
            increment_rate,
        }
    }

    /// Price the next buyer of `affinity` would pay.
    pub fn quote(&self, affinity: Affinity) -> Cycles {
        if affinity.is_elemental() {
            self.elemental_cost
        } else {
            self.neutral_cost
        }
    }

    /// Advances the elemental curve by one sale and returns the price charged.
    pub(crate) fn advance_elemental(&mut self) -> Cycles {
        let charged = self.elemental_cost;
        self.elemental_cost = next_elemental_cost(charged, self.increment_rate);
        charged
    }

    pub fn neutral_cost(&self) -> Cycles {
        self.neutral_cost
    }

    pub fn elemental_cost(&self) -> Cycles {
        self.elemental_cost
    }

    pub fn increment_rate(&self) -> u128 {
        self.increment_rate
    }
}
