//! Structured record of the feasibility gates fired within one step. Each
//! step's trace reads as the decision path the dispatcher took.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Allocation mode chosen by the minimum-load dispatcher, by renewable supply
/// regime and by which buffers can cover the shortfall.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum MinLoadMode {
    /// Supply below the reduced demand; storage covers the hydrogen gap and
    /// the battery covers the rest of the electricity gap.
    DeficitHydrogenFull,
    /// Supply below the reduced demand; storage hydrogen keeps the
    /// electrolyzer at its own minimum load.
    DeficitHydrogenElyMin,
    /// Supply below the reduced demand; storage covers part of the hydrogen
    /// gap, the battery the remainder.
    DeficitHydrogenPartial,
    /// Supply below the reduced demand; the battery alone covers the gap.
    DeficitBatteryOnly,
    /// Supply between reduced and full minimum demand; storage hydrogen keeps
    /// the electrolyzer at its own minimum load.
    BandHydrogenElyMin,
    /// Supply between reduced and full minimum demand; storage hydrogen frees
    /// enough electricity to fully recharge the battery.
    BandHydrogenFullCharge,
    /// Supply between reduced and full minimum demand; storage hydrogen frees
    /// electricity for a partial battery charge.
    BandHydrogenPartial,
    /// Supply between reduced and full minimum demand; surplus electricity
    /// goes to the battery without touching storage.
    BandBatteryOnly,
    /// Supply above the minimum demand; the excess displaces electrolysis in
    /// favour of stored hydrogen.
    SurplusHydrogenOnly,
    /// Supply above the minimum demand; stored hydrogen plus a battery charge
    /// absorb the excess.
    SurplusHydrogenThenBattery,
    /// Supply above the minimum demand; the battery alone absorbs the excess.
    SurplusBatteryOnly,
}

/// One fired feasibility gate.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GateOutcome {
    /// Renewables cover the nominal demand.
    NominalFeasible,
    NominalInfeasible,

    /// A buffer sits below its minimum-SOC floor and claims surplus first.
    FloorDeficit,
    FloorSatisfied,

    /// The hydrogen store can absorb more of the surplus.
    StorageHeadroom,
    StorageFull,

    /// Surplus exceeds what the full storage path can take.
    SurplusBeyondStorage,
    SurplusWithinStorage,

    /// Carbon-bearing inventory was vented and replaced by fresh hydrogen.
    ReplacementTriggered,
    ReplacementSkipped,

    /// Grid electricity within the CI budget can lift supply to the minimum
    /// demand.
    GridMinFeasible,
    GridMinInfeasible,

    /// Flexible buffer inventory can raise the output above the minimum.
    FlexPotential,
    NoFlexPotential,

    /// The minimum-load dispatcher selected an allocation mode.
    MinLoad(MinLoadMode),
    /// No buffer combination reaches the minimum load.
    MinLoadInfeasible,

    /// The restart clock keeps the synthesis loop offline.
    SynthesisBlocked,

    /// Standby consumption covered by renewables alone.
    StandbyFromRes,
    /// Standby consumption needs the battery or the grid.
    StandbyNeedsStorage,

    BatteryBelowFloor,
    BatteryAtFloor,

    /// Leftover renewables feed the electrolyzer while the loop is in standby.
    RefillElectrolyzer,
    ElectrolyzerIdle,

    /// Standby covered by renewables plus the battery.
    StandbyResBattery,
    /// Standby needs a grid import on top of renewables and the battery.
    StandbyResBatteryGrid,
}

impl Display for GateOutcome {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{self:?}")
    }
}

/// Ordered gate outcomes of one step.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct GateTrace(Vec<GateOutcome>);

impl GateTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: GateOutcome) {
        self.0.push(outcome);
    }

    pub fn fired(&self, outcome: GateOutcome) -> bool {
        self.0.contains(&outcome)
    }

    pub fn outcomes(&self) -> &[GateOutcome] {
        &self.0
    }

    /// The allocation mode, when the minimum-load dispatcher ran.
    pub fn min_load_mode(&self) -> Option<MinLoadMode> {
        self.0.iter().find_map(|outcome| match outcome {
            GateOutcome::MinLoad(mode) => Some(*mode),
            _ => None,
        })
    }
}

impl Display for GateTrace {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        for (index, outcome) in self.0.iter().enumerate() {
            if index != 0 {
                formatter.write_str(" -> ")?;
            }
            write!(formatter, "{outcome}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_keeps_order_and_membership() {
        let mut trace = GateTrace::new();
        trace.push(GateOutcome::NominalInfeasible);
        trace.push(GateOutcome::GridMinFeasible);
        assert!(trace.fired(GateOutcome::NominalInfeasible));
        assert!(!trace.fired(GateOutcome::SynthesisBlocked));
        assert_eq!(trace.to_string(), "NominalInfeasible -> GridMinFeasible");
    }

    #[test]
    fn test_min_load_mode_lookup() {
        let mut trace = GateTrace::new();
        trace.push(GateOutcome::GridMinInfeasible);
        trace.push(GateOutcome::MinLoad(MinLoadMode::BandBatteryOnly));
        assert_eq!(trace.min_load_mode(), Some(MinLoadMode::BandBatteryOnly));
    }
}
