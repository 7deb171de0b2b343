//! Canary-by-weight allocation.
//!
//! Baseline backends share whatever the explicit canary weights leave of the
//! total; every resulting weight is clamped to the total.

use crate::BackendRef;

/// A backend reference awaiting a weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightSlot {
    /// The backend.
    pub backend: BackendRef,
    /// Explicit canary weight, or `None` for a baseline backend.
    pub explicit: Option<i32>,
}

/// Weights of a canary split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Backends with their final weight, baselines first.
    pub backends: Vec<BackendRef>,
    /// The total the weights are relative to.
    pub total: i32,
}

impl Allocation {
    /// Sum of every assigned weight.
    pub fn sum(&self) -> i64 {
        self.backends
            .iter()
            .map(|b| i64::from(b.weight.unwrap_or(0)))
            .sum()
    }
}

/// Assign weights to `slots`.
///
/// `remaining = max(0, total − Σexplicit)`; each baseline receives
/// `remaining / baselines` (integer division); with no baseline nothing is
/// divided. Returns `None` when there is no slot at all.
pub fn allocate(slots: Vec<WeightSlot>, total: i32) -> Option<Allocation> {
    if slots.is_empty() {
        return None;
    }

    let explicit_sum: i64 = slots
        .iter()
        .filter_map(|s| s.explicit)
        .map(i64::from)
        .sum();
    let baselines = slots.iter().filter(|s| s.explicit.is_none()).count();
    let remaining = (i64::from(total) - explicit_sum).max(0);
    let share = if baselines > 0 {
        // bounded by `total`, which is an i32
        i32::try_from(remaining / baselines as i64).unwrap_or(total)
    } else {
        0
    };

    let backends = slots
        .into_iter()
        .map(|slot| {
            let weight = slot.explicit.unwrap_or(share).min(total);
            slot.backend.with_weight(weight)
        })
        .collect();

    Some(Allocation { backends, total })
}
