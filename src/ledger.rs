//! Batch-level hydrogen accounting. Every deposit keeps its carbon-intensity
//! provenance; withdrawals drain the oldest batches first.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{
    error::LedgerError,
    units::{GramsPerMegajoule, Quantity, TonnesHydrogen},
};

/// Masses closer than this are considered equal, absorbing the rounding noise
/// of the hourly allocation arithmetic.
pub const MASS_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Batch {
    /// Step at which the batch was deposited.
    pub step: usize,
    pub mass: TonnesHydrogen,
    pub ci: GramsPerMegajoule,
}

/// FIFO store of hydrogen batches.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct HydrogenLedger {
    batches: VecDeque<Batch>,
}

impl HydrogenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> TonnesHydrogen {
        self.batches.iter().map(|batch| batch.mass).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.batches.iter()
    }

    /// Mass-weighted carbon intensity of the entire inventory.
    pub fn weighted_ci(&self) -> GramsPerMegajoule {
        let total = self.total();
        if total.0 <= MASS_EPSILON {
            return GramsPerMegajoule::ZERO;
        }
        let weighted: f64 = self
            .batches
            .iter()
            .map(|batch| batch.mass.0 * batch.ci.0)
            .sum();
        Quantity(weighted / total.0)
    }

    /// Adds a batch. Consecutive deposits within the same step and at the same
    /// carbon intensity extend the trailing batch instead of fragmenting it.
    pub fn deposit(
        &mut self,
        step: usize,
        mass: TonnesHydrogen,
        ci: GramsPerMegajoule,
    ) -> Result<(), LedgerError> {
        if mass.0 < -MASS_EPSILON {
            return Err(LedgerError::NegativeDeposit { mass: mass.0 });
        }
        if mass.0 <= MASS_EPSILON {
            return Ok(());
        }
        if let Some(last) = self.batches.back_mut()
            && last.step == step
            && last.ci == ci
        {
            last.mass += mass;
            return Ok(());
        }
        self.batches.push_back(Batch { step, mass, ci });
        Ok(())
    }

    /// Removes `mass` from the oldest batches and returns the mass-weighted
    /// carbon intensity of what was removed.
    pub fn withdraw(&mut self, mass: TonnesHydrogen) -> Result<GramsPerMegajoule, LedgerError> {
        if mass.0 < -MASS_EPSILON {
            return Err(LedgerError::NegativeWithdrawal { requested: mass.0 });
        }
        if mass.0 <= MASS_EPSILON {
            return Ok(GramsPerMegajoule::ZERO);
        }
        let available = self.total();
        if mass.0 > available.0 + MASS_EPSILON {
            return Err(LedgerError::Overdraw { requested: mass.0, available: available.0 });
        }
        if (available.0 - mass.0).abs() <= MASS_EPSILON {
            let ci = self.weighted_ci();
            self.batches.clear();
            return Ok(ci);
        }

        let mut remaining = mass;
        let mut weighted = 0.0;
        while remaining.0 > MASS_EPSILON {
            // Guarded by the overdraw check above.
            let Some(front) = self.batches.front_mut() else {
                break;
            };
            let taken = front.mass.min(remaining);
            weighted += taken.0 * front.ci.0;
            remaining -= taken;
            front.mass -= taken;
            if front.mass.0 <= MASS_EPSILON {
                self.batches.pop_front();
            }
        }
        Ok(Quantity(weighted / mass.0))
    }

    /// Vents up to `threshold` of the oldest inventory, provided the vented
    /// span reaches at least one carbon-bearing batch, and refills with up to
    /// the vented mass of fresh hydrogen at `ci`.
    ///
    /// Returns the vented and the deposited mass. Both are zero when no batch
    /// within the threshold carries CO2, in which case nothing is deposited.
    pub fn evict_and_replace(
        &mut self,
        threshold: TonnesHydrogen,
        new_mass: TonnesHydrogen,
        ci: GramsPerMegajoule,
        step: usize,
    ) -> Result<(TonnesHydrogen, TonnesHydrogen), LedgerError> {
        if threshold.0 <= MASS_EPSILON {
            return Ok((TonnesHydrogen::ZERO, TonnesHydrogen::ZERO));
        }

        // Last carbon-bearing batch that still starts below the threshold.
        let mut cumulative = TonnesHydrogen::ZERO;
        let mut last_dirty = None;
        for (index, batch) in self.batches.iter().enumerate() {
            if cumulative.0 >= threshold.0 {
                break;
            }
            if batch.ci > GramsPerMegajoule::ZERO {
                last_dirty = Some(index);
            }
            cumulative += batch.mass;
        }
        let Some(last_dirty) = last_dirty else {
            return Ok((TonnesHydrogen::ZERO, TonnesHydrogen::ZERO));
        };

        let prefix_total: TonnesHydrogen =
            self.batches.iter().take(last_dirty + 1).map(|batch| batch.mass).sum();
        let vented = prefix_total.min(threshold);
        let keep = prefix_total - vented;
        let tail = self.batches[last_dirty];
        self.batches.drain(..=last_dirty);
        if keep.0 > MASS_EPSILON {
            self.batches.push_front(Batch { mass: keep, ..tail });
        }

        let deposited = new_mass.min(vented).max(TonnesHydrogen::ZERO);
        self.deposit(step, deposited, ci)?;
        Ok((vented, deposited))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_withdraw_is_mass_weighted() {
        let mut ledger = HydrogenLedger::new();
        ledger.deposit(0, Quantity(2.0), Quantity(10.0)).unwrap();
        ledger.deposit(1, Quantity(3.0), Quantity(2.0)).unwrap();

        // 2 t at 10 plus 2 t at 2 averages to 6 g/MJ.
        let ci = ledger.withdraw(Quantity(4.0)).unwrap();
        assert_abs_diff_eq!(ci.0, 6.0);
        assert_abs_diff_eq!(ledger.total().0, 1.0);
        assert_abs_diff_eq!(ledger.weighted_ci().0, 2.0);
    }

    #[test]
    fn test_full_drain_returns_inventory_ci() {
        let mut ledger = HydrogenLedger::new();
        ledger.deposit(0, Quantity(1.0), Quantity(4.0)).unwrap();
        ledger.deposit(1, Quantity(1.0), Quantity(8.0)).unwrap();

        let ci = ledger.withdraw(Quantity(2.0)).unwrap();
        assert_abs_diff_eq!(ci.0, 6.0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_overdraw_is_rejected() {
        let mut ledger = HydrogenLedger::new();
        ledger.deposit(0, Quantity(1.0), Quantity(0.0)).unwrap();
        assert_eq!(
            ledger.withdraw(Quantity(2.0)),
            Err(LedgerError::Overdraw { requested: 2.0, available: 1.0 }),
        );
    }

    #[test]
    fn test_same_step_deposits_merge() {
        let mut ledger = HydrogenLedger::new();
        ledger.deposit(3, Quantity(1.0), Quantity(2.0)).unwrap();
        ledger.deposit(3, Quantity(1.5), Quantity(2.0)).unwrap();
        ledger.deposit(4, Quantity(1.0), Quantity(2.0)).unwrap();
        assert_eq!(ledger.batches().count(), 2);
        assert_abs_diff_eq!(ledger.total().0, 3.5);
    }

    #[test]
    fn test_evict_and_replace_partial_batch() {
        let mut ledger = HydrogenLedger::new();
        ledger.deposit(0, Quantity(2.0), Quantity(10.0)).unwrap();
        ledger.deposit(1, Quantity(2.0), Quantity(0.0)).unwrap();

        let (vented, deposited) = ledger
            .evict_and_replace(Quantity(1.5), Quantity(3.0), Quantity(0.0), 2)
            .unwrap();
        assert_abs_diff_eq!(vented.0, 1.5);
        assert_abs_diff_eq!(deposited.0, 1.5);
        // 0.5 t of the dirty batch remains in front, then 2 t clean, then the refill.
        assert_abs_diff_eq!(ledger.total().0, 4.0);
        let first = *ledger.batches().next().unwrap();
        assert_abs_diff_eq!(first.mass.0, 0.5);
        assert_abs_diff_eq!(first.ci.0, 10.0);
    }

    #[test]
    fn test_evict_skips_clean_inventory() {
        let mut ledger = HydrogenLedger::new();
        ledger.deposit(0, Quantity(2.0), Quantity(0.0)).unwrap();

        let (vented, deposited) = ledger
            .evict_and_replace(Quantity(1.0), Quantity(1.0), Quantity(0.0), 1)
            .unwrap();
        assert_eq!(vented, TonnesHydrogen::ZERO);
        assert_eq!(deposited, TonnesHydrogen::ZERO);
        assert_abs_diff_eq!(ledger.total().0, 2.0);
    }

    #[test]
    fn test_evict_vents_clean_prefix_before_dirty_batch() {
        let mut ledger = HydrogenLedger::new();
        ledger.deposit(0, Quantity(0.5), Quantity(0.0)).unwrap();
        ledger.deposit(1, Quantity(1.0), Quantity(10.0)).unwrap();

        let (vented, deposited) = ledger
            .evict_and_replace(Quantity(2.0), Quantity(0.5), Quantity(0.0), 2)
            .unwrap();
        assert_abs_diff_eq!(vented.0, 1.5);
        assert_abs_diff_eq!(deposited.0, 0.5);
        assert_abs_diff_eq!(ledger.total().0, 0.5);
        assert_eq!(ledger.weighted_ci(), GramsPerMegajoule::ZERO);
    }
}
