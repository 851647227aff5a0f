//! Calendar ageing of the battery and the electrolyzer.
//!
//! Degradation is applied once per crossed month boundary, proportionally to
//! the share of the year the elapsed month covers. The component states are
//! plain values updated by pure functions, so a step's ratings never depend on
//! anything but the previous state and the elapsed time.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::{
    config::{BatterySpec, ElectrolyzerSpec},
    units::{MegawattHours, MwhPerTonneHydrogen, Quantity},
};

/// Current battery ratings, starting at the configured values.
#[derive(Clone, Copy, Debug)]
pub struct BatteryState {
    pub capacity: MegawattHours,
    pub charge_efficiency: f64,
    pub discharge_efficiency: f64,
}

impl BatteryState {
    pub fn from_spec(spec: &BatterySpec) -> Self {
        Self {
            capacity: spec.capacity,
            charge_efficiency: spec.charge_efficiency,
            discharge_efficiency: spec.discharge_efficiency,
        }
    }

    /// Ages the battery by `share` of a year. Capacity fades relative to the
    /// initial rating, efficiencies drop by an absolute amount.
    pub fn degrade(&mut self, spec: &BatterySpec, share: f64) {
        self.capacity =
            (self.capacity - spec.capacity * (spec.capacity_degradation * share)).max(Quantity(0.0));
        self.charge_efficiency =
            (self.charge_efficiency - spec.efficiency_degradation * share).max(0.0);
        self.discharge_efficiency =
            (self.discharge_efficiency - spec.efficiency_degradation * share).max(0.0);
    }
}

/// Current electrolyzer rating.
#[derive(Clone, Copy, Debug)]
pub struct ElectrolyzerState {
    pub specific_energy: MwhPerTonneHydrogen,
}

impl ElectrolyzerState {
    pub fn from_spec(spec: &ElectrolyzerSpec) -> Self {
        Self { specific_energy: spec.specific_energy }
    }

    /// Ages the electrolyzer by `share` of a year. More energy is needed per
    /// tonne of hydrogen as the stack wears.
    pub fn degrade(&mut self, spec: &ElectrolyzerSpec, share: f64) {
        self.specific_energy +=
            spec.specific_energy * (spec.specific_energy_degradation * share);
    }
}

/// Detects month boundaries in the hourly timestamp stream.
#[derive(Clone, Copy, Debug)]
pub struct MonthTracker {
    year: i32,
    month: u32,
}

impl MonthTracker {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { year: start.year(), month: start.month() }
    }

    /// Advances the tracker to `time`. On a month change, returns the share of
    /// the year covered by the month that just elapsed.
    pub fn advance(&mut self, time: NaiveDateTime) -> Option<f64> {
        if time.year() == self.year && time.month() == self.month {
            return None;
        }
        let share = f64::from(days_in_month(self.year, self.month))
            / f64::from(days_in_year(self.year));
        self.year = time.year();
        self.month = time.month();
        Some(share)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default());
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.map_or(31, |next| (next - first).num_days() as u32)
}

fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() { 366 } else { 365 }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::config::tests::default_config;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_no_event_within_a_month() {
        let mut tracker = MonthTracker::new(at(2021, 1, 1, 0));
        assert_eq!(tracker.advance(at(2021, 1, 31, 23)), None);
    }

    #[test]
    fn test_month_boundary_yields_elapsed_share() {
        let mut tracker = MonthTracker::new(at(2021, 1, 1, 0));
        let share = tracker.advance(at(2021, 2, 1, 0)).unwrap();
        assert_abs_diff_eq!(share, 31.0 / 365.0);
        // No second event until March.
        assert_eq!(tracker.advance(at(2021, 2, 15, 0)), None);
    }

    #[test]
    fn test_leap_february_share() {
        let mut tracker = MonthTracker::new(at(2020, 2, 1, 0));
        let share = tracker.advance(at(2020, 3, 1, 0)).unwrap();
        assert_abs_diff_eq!(share, 29.0 / 366.0);
    }

    #[test]
    fn test_december_rollover() {
        let mut tracker = MonthTracker::new(at(2021, 12, 1, 0));
        let share = tracker.advance(at(2022, 1, 1, 0)).unwrap();
        assert_abs_diff_eq!(share, 31.0 / 365.0);
    }

    #[test]
    fn test_battery_degrades_monotonically() {
        let config = default_config();
        let mut state = BatteryState::from_spec(&config.battery);
        let fresh = state;
        state.degrade(&config.battery, 31.0 / 365.0);
        assert!(state.capacity < fresh.capacity);
        assert!(state.charge_efficiency < fresh.charge_efficiency);
        assert!(state.discharge_efficiency < fresh.discharge_efficiency);

        // A full year of monthly shares sums to the annual rates.
        let mut yearly = BatteryState::from_spec(&config.battery);
        let mut tracker = MonthTracker::new(at(2021, 1, 1, 0));
        for month in 1..=12 {
            let (year, month) = if month == 12 { (2022, 1) } else { (2021, month + 1) };
            let share = tracker.advance(at(year, month, 1, 0)).unwrap();
            yearly.degrade(&config.battery, share);
        }
        assert_abs_diff_eq!(
            yearly.capacity.0,
            config.battery.capacity.0 * (1.0 - config.battery.capacity_degradation),
            epsilon = 1e-9,
        );
    }

    #[test]
    fn test_electrolyzer_specific_energy_rises() {
        let config = default_config();
        let mut state = ElectrolyzerState::from_spec(&config.electrolyzer);
        state.degrade(&config.electrolyzer, 0.5);
        assert_abs_diff_eq!(
            state.specific_energy.0,
            config.electrolyzer.specific_energy.0
                * (1.0 + 0.5 * config.electrolyzer.specific_energy_degradation),
            epsilon = 1e-9,
        );
    }
}
