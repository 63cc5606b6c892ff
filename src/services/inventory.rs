//! Inventory rule engine.
//!
//! Pure normalization of the three coupled artifact fields:
//! `preservation_status`, `total_amount`, `available_amount`. The rules encode
//! one domain fact: restoration removes an item from display, and the
//! displayed count can never exceed the physical count.
//!
//! Invariants guaranteed after normalization:
//! - `total_amount >= 1`
//! - `available_amount >= 0`
//! - `available_amount <= total_amount`
//! - `preservation_status == 修复中` implies `available_amount == 0`
//!
//! Normalization never rejects input. Each correction is reported as an
//! [`Adjustment`] so the caller can log or surface it; the functions here
//! stay side-effect free.

use crate::models::artifact::PreservationStatus;

/// The three inventory-coupled fields of an artifact record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryState {
    pub preservation_status: PreservationStatus,
    pub total_amount: i32,
    pub available_amount: i32,
}

/// Partial update to the inventory fields. `None` means the caller did not
/// supply the field; the existing value stays in effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryPatch {
    pub preservation_status: Option<PreservationStatus>,
    pub total_amount: Option<i32>,
    pub available_amount: Option<i32>,
}

/// A silent correction applied during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// Status is 修复中, so the displayable count was forced to zero.
    RestorationForcedZero,
    /// Displayable count exceeded the total and was clamped down to it.
    ClampedToTotal,
    /// Displayable count was negative and was raised to zero.
    RaisedToZero,
    /// A non-positive total was supplied on update; the stored total was
    /// kept instead.
    IgnoredNonPositiveTotal,
}

/// Outcome of normalizing an update: the effective field values, which of
/// them must be written back, and the corrections that were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUpdate {
    pub state: InventoryState,
    /// True when `preservation_status` is part of the outgoing update.
    pub write_status: bool,
    /// True when `total_amount` is part of the outgoing update.
    pub write_total: bool,
    /// True when `available_amount` is part of the outgoing update, whether
    /// supplied by the caller or forced by a rule.
    pub write_available: bool,
    pub adjustments: Vec<Adjustment>,
}

impl NormalizedUpdate {
    /// True when normalization produced nothing to persist for these fields.
    pub fn is_noop(&self) -> bool {
        !(self.write_status || self.write_total || self.write_available)
    }
}

/// Normalize candidate fields for a create.
///
/// Defaults: status 完好, total 1 (a non-positive total is treated as
/// unset), available 0.
pub fn normalize_create(
    preservation_status: Option<PreservationStatus>,
    total_amount: Option<i32>,
    available_amount: Option<i32>,
) -> (InventoryState, Vec<Adjustment>) {
    let status = preservation_status.unwrap_or(PreservationStatus::Intact);
    let total = match total_amount {
        // A non-positive total has no physical meaning on create; fall back
        // to the single-piece default.
        Some(t) if t > 0 => t,
        _ => 1,
    };
    let available = available_amount.unwrap_or(0);

    let (available, adjustments) = apply_rules(status, total, available);

    (
        InventoryState {
            preservation_status: status,
            total_amount: total,
            available_amount: available,
        },
        adjustments,
    )
}

/// Normalize a partial update against the current record.
///
/// Effective values are the patched ones where present, the current ones
/// otherwise. When the effective status is 修复中 the available amount is
/// written back as zero even if the caller did not touch it; likewise a
/// clamp marks the field as written. Lowering `total_amount` re-applies the
/// clamp implicitly because the clamp always runs against the effective
/// (new) total.
///
/// Moving away from 修复中 while the available amount is still zero passes
/// through unchanged; the system never auto-restores a displayable count.
///
/// A total, like on create, must stay positive: a patched total of zero or
/// less is ignored in favor of the stored one, so a record can never reach
/// a state where no physical piece exists.
pub fn normalize_update(current: InventoryState, patch: InventoryPatch) -> NormalizedUpdate {
    let status = patch.preservation_status.unwrap_or(current.preservation_status);
    let available = patch.available_amount.unwrap_or(current.available_amount);

    let mut adjustments = Vec::new();
    let total = match patch.total_amount {
        Some(t) if t <= 0 => {
            adjustments.push(Adjustment::IgnoredNonPositiveTotal);
            current.total_amount
        }
        Some(t) => t,
        None => current.total_amount,
    };

    let mut write_available = patch.available_amount.is_some();

    let (available, rule_adjustments) = apply_rules(status, total, available);

    // The outgoing update always carries the forced zero while in
    // restoration, and any clamped value, so the stored row cannot drift.
    if status == PreservationStatus::UnderRestoration || !rule_adjustments.is_empty() {
        write_available = true;
    }
    adjustments.extend(rule_adjustments);

    NormalizedUpdate {
        state: InventoryState {
            preservation_status: status,
            total_amount: total,
            available_amount: available,
        },
        write_status: patch.preservation_status.is_some(),
        write_total: patch.total_amount.is_some(),
        write_available,
        adjustments,
    }
}

/// The three rules, in order. Each step operates on the output of the
/// previous one.
fn apply_rules(
    status: PreservationStatus,
    total: i32,
    mut available: i32,
) -> (i32, Vec<Adjustment>) {
    let mut adjustments = Vec::new();

    if status == PreservationStatus::UnderRestoration && available != 0 {
        available = 0;
        adjustments.push(Adjustment::RestorationForcedZero);
    }

    if available > total {
        available = total;
        adjustments.push(Adjustment::ClampedToTotal);
    }

    if available < 0 {
        available = 0;
        adjustments.push(Adjustment::RaisedToZero);
    }

    (available, adjustments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::artifact::PreservationStatus::{Intact, UnderRestoration};

    fn state(status: PreservationStatus, total: i32, available: i32) -> InventoryState {
        InventoryState {
            preservation_status: status,
            total_amount: total,
            available_amount: available,
        }
    }

    #[test]
    fn test_create_defaults() {
        let (out, adjustments) = normalize_create(None, None, None);
        assert_eq!(out, state(Intact, 1, 0));
        assert!(adjustments.is_empty());
    }

    #[test]
    fn test_create_zero_total_falls_back_to_one() {
        let (out, _) = normalize_create(None, Some(0), None);
        assert_eq!(out.total_amount, 1);
    }

    #[test]
    fn test_create_clamps_available_to_total() {
        // Scenario A: total 5, available 10, intact -> stored available 5
        let (out, adjustments) = normalize_create(Some(Intact), Some(5), Some(10));
        assert_eq!(out, state(Intact, 5, 5));
        assert_eq!(adjustments, vec![Adjustment::ClampedToTotal]);
    }

    #[test]
    fn test_create_restoration_forces_zero() {
        // Scenario B: total 3, available 2, under restoration -> stored available 0
        let (out, adjustments) = normalize_create(Some(UnderRestoration), Some(3), Some(2));
        assert_eq!(out, state(UnderRestoration, 3, 0));
        assert_eq!(adjustments, vec![Adjustment::RestorationForcedZero]);
    }

    #[test]
    fn test_create_negative_available_raised_to_zero() {
        let (out, adjustments) = normalize_create(Some(Intact), Some(4), Some(-3));
        assert_eq!(out.available_amount, 0);
        assert_eq!(adjustments, vec![Adjustment::RaisedToZero]);
    }

    #[test]
    fn test_create_invariants_hold_for_any_input() {
        for total in [-2, 0, 1, 3, 7] {
            for available in [-5, 0, 2, 9] {
                for status in [Intact, UnderRestoration] {
                    let (out, _) =
                        normalize_create(Some(status), Some(total), Some(available));
                    assert!(out.available_amount >= 0);
                    assert!(out.available_amount <= out.total_amount);
                    if out.preservation_status == UnderRestoration {
                        assert_eq!(out.available_amount, 0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_update_status_to_restoration_zeroes_available() {
        // Scenario C: {total 10, available 8, intact} updated with status only
        let current = state(Intact, 10, 8);
        let out = normalize_update(
            current,
            InventoryPatch {
                preservation_status: Some(UnderRestoration),
                ..Default::default()
            },
        );
        assert_eq!(out.state, state(UnderRestoration, 10, 0));
        assert!(out.write_status);
        assert!(out.write_available, "forced zero must reach the store");
        assert!(!out.write_total);
        assert_eq!(out.adjustments, vec![Adjustment::RestorationForcedZero]);
    }

    #[test]
    fn test_update_lowered_total_reclamps_available() {
        // Scenario D: {total 10, available 8} updated with total 5 only
        let current = state(Intact, 10, 8);
        let out = normalize_update(
            current,
            InventoryPatch {
                total_amount: Some(5),
                ..Default::default()
            },
        );
        assert_eq!(out.state, state(Intact, 5, 5));
        assert!(out.write_total);
        assert!(out.write_available);
        assert_eq!(out.adjustments, vec![Adjustment::ClampedToTotal]);
    }

    #[test]
    fn test_update_leaving_restoration_keeps_zero() {
        // No auto-restore: the caller must raise the amount explicitly.
        let current = state(UnderRestoration, 6, 0);
        let out = normalize_update(
            current,
            InventoryPatch {
                preservation_status: Some(Intact),
                ..Default::default()
            },
        );
        assert_eq!(out.state, state(Intact, 6, 0));
        assert!(out.adjustments.is_empty());
        assert!(!out.write_available);
    }

    #[test]
    fn test_update_nonpositive_total_keeps_stored_total() {
        let current = state(Intact, 5, 3);
        for bad_total in [0, -1, -10] {
            let out = normalize_update(
                current,
                InventoryPatch {
                    total_amount: Some(bad_total),
                    ..Default::default()
                },
            );
            assert_eq!(out.state.total_amount, 5);
            assert_eq!(out.state.available_amount, 3);
            assert!(out.adjustments.contains(&Adjustment::IgnoredNonPositiveTotal));
        }
    }

    #[test]
    fn test_update_nonpositive_total_cannot_break_ordering() {
        // A negative total must never leave the row with available > total.
        let current = state(Intact, 5, 0);
        let out = normalize_update(
            current,
            InventoryPatch {
                total_amount: Some(-1),
                ..Default::default()
            },
        );
        assert!(out.state.total_amount >= 1);
        assert!(out.state.available_amount <= out.state.total_amount);
    }

    #[test]
    fn test_update_untouched_fields_are_noop() {
        let current = state(Intact, 4, 2);
        let out = normalize_update(current, InventoryPatch::default());
        assert!(out.is_noop());
        assert_eq!(out.state, current);
    }

    #[test]
    fn test_update_on_restoration_record_repins_zero() {
        // Touching an unrelated inventory field of a record already in
        // restoration still pins available to zero in the outgoing update.
        let current = state(UnderRestoration, 4, 0);
        let out = normalize_update(
            current,
            InventoryPatch {
                total_amount: Some(9),
                ..Default::default()
            },
        );
        assert_eq!(out.state.available_amount, 0);
        assert!(out.write_available);
        assert!(out.adjustments.is_empty());
    }

    #[test]
    fn test_update_idempotent_on_normalized_data() {
        let current = state(Intact, 10, 8);
        let patch = InventoryPatch {
            total_amount: Some(5),
            preservation_status: Some(Intact),
            available_amount: None,
        };
        let first = normalize_update(current, patch);
        let second = normalize_update(first.state, patch);
        assert_eq!(second.state, first.state);
        assert!(second.adjustments.is_empty());
    }

    #[test]
    fn test_update_invariants_hold_for_any_patch() {
        let current = state(Intact, 5, 3);
        for status in [None, Some(Intact), Some(UnderRestoration)] {
            for total in [None, Some(-1), Some(0), Some(2), Some(8)] {
                for available in [None, Some(-4), Some(0), Some(3), Some(11)] {
                    let out = normalize_update(
                        current,
                        InventoryPatch {
                            preservation_status: status,
                            total_amount: total,
                            available_amount: available,
                        },
                    );
                    assert!(out.state.total_amount >= 1);
                    assert!(out.state.available_amount >= 0);
                    assert!(out.state.available_amount <= out.state.total_amount);
                    if out.state.preservation_status == UnderRestoration {
                        assert_eq!(out.state.available_amount, 0);
                    }
                }
            }
        }
    }
}
