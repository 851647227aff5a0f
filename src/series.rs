//! Hourly renewable capacity-factor series driving the dispatch loop.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// One hour of renewable availability. The capacity factors scale the wind
/// and PV nominal powers configured on the plant; values above 1.0 are allowed
/// for briefly-above-nominal output.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct ResSample {
    pub time: NaiveDateTime,
    pub wind_cf: f64,
    pub pv_cf: f64,
}

/// A validated, strictly hourly series of [`ResSample`]s.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(try_from = "Vec<ResSample>", into = "Vec<ResSample>")]
pub struct ResSeries(Vec<ResSample>);

impl ResSeries {
    pub fn new(samples: Vec<ResSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(SimulationError::configuration("the renewable series is empty"));
        }
        for (index, sample) in samples.iter().enumerate() {
            if !(sample.wind_cf.is_finite() && sample.wind_cf >= 0.0) {
                return Err(SimulationError::configuration(format!(
                    "wind capacity factor at sample {index} ({}) must be finite and non-negative, got {}",
                    sample.time, sample.wind_cf,
                )));
            }
            if !(sample.pv_cf.is_finite() && sample.pv_cf >= 0.0) {
                return Err(SimulationError::configuration(format!(
                    "PV capacity factor at sample {index} ({}) must be finite and non-negative, got {}",
                    sample.time, sample.pv_cf,
                )));
            }
        }
        for (index, pair) in samples.windows(2).enumerate() {
            let gap = pair[1].time - pair[0].time;
            if gap != Duration::hours(1) {
                return Err(SimulationError::configuration(format!(
                    "samples {index} and {} are {gap} apart, expected exactly one hour",
                    index + 1,
                )));
            }
        }
        Ok(Self(samples))
    }

    pub fn samples(&self) -> &[ResSample] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Timestamp of the first sample. The series is never empty.
    pub fn start_time(&self) -> NaiveDateTime {
        self.0[0].time
    }
}

impl TryFrom<Vec<ResSample>> for ResSeries {
    type Error = SimulationError;

    fn try_from(samples: Vec<ResSample>) -> Result<Self> {
        Self::new(samples)
    }
}

impl From<ResSeries> for Vec<ResSample> {
    fn from(series: ResSeries) -> Self {
        series.0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;

    use super::*;

    pub(crate) fn hourly(start: NaiveDateTime, factors: &[(f64, f64)]) -> Vec<ResSample> {
        factors
            .iter()
            .enumerate()
            .map(|(hour, &(wind_cf, pv_cf))| ResSample {
                time: start + Duration::hours(hour as i64),
                wind_cf,
                pv_cf,
            })
            .collect()
    }

    pub(crate) fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_hourly_series_is_accepted() {
        let series =
            ResSeries::new(hourly(start(), &[(0.5, 0.0), (0.6, 0.1), (0.7, 0.2)])).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.start_time(), start());
    }

    #[test]
    fn test_empty_series_is_rejected() {
        assert!(ResSeries::new(Vec::new()).is_err());
    }

    #[test]
    fn test_gap_is_rejected() {
        let mut samples = hourly(start(), &[(0.5, 0.0), (0.6, 0.1)]);
        samples[1].time += Duration::hours(1);
        assert!(ResSeries::new(samples).is_err());
    }

    #[test]
    fn test_out_of_order_series_is_rejected() {
        let mut samples = hourly(start(), &[(0.5, 0.0), (0.6, 0.1)]);
        samples.swap(0, 1);
        assert!(ResSeries::new(samples).is_err());
    }

    #[test]
    fn test_negative_capacity_factor_is_rejected() {
        let samples = hourly(start(), &[(-0.1, 0.0)]);
        assert!(ResSeries::new(samples).is_err());
        let samples = hourly(start(), &[(0.5, f64::NAN)]);
        assert!(ResSeries::new(samples).is_err());
    }

    #[test]
    fn test_above_nominal_capacity_factor_is_accepted() {
        let series = ResSeries::new(hourly(start(), &[(1.02, 0.0)])).unwrap();
        assert_eq!(series.len(), 1);
    }
}
