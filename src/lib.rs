//! Hourly dispatch simulation of a renewables-powered ammonia plant.
//!
//! Wind and PV feed an electrolyzer, a battery, a compressed-hydrogen store
//! with batch-level carbon-intensity provenance, and a Haber-Bosch synthesis
//! loop with a grid connection capped by the product's carbon-intensity
//! budget. [`Simulation`] walks a capacity-factor series and emits one
//! [`TimestepRecord`] per hour.

pub mod config;
pub mod degradation;
pub mod error;
pub mod ledger;
mod prelude;
pub mod record;
pub mod restart;
pub mod series;
pub mod shutdown;
pub mod simulation;
pub mod trace;
pub mod units;

pub use self::{
    config::PlantConfig,
    error::{LedgerError, SimulationError},
    ledger::{Batch, HydrogenLedger},
    record::{OperationalSeries, TimestepRecord},
    series::{ResSample, ResSeries},
    simulation::Simulation,
    trace::{GateOutcome, GateTrace, MinLoadMode},
};
