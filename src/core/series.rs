use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::algorithms::common::{mean, sample_std};

/// Identifier of a registered facility.
pub type HospitalId = u64;

/// A registered facility with its location and bed capacity.
///
/// Location is fixed at registration; the capacity counts are refreshed by the
/// caller before each alert cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalNode {
    pub id: HospitalId,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub total_beds: u32,
    #[serde(default)]
    pub icu_beds: u32,
    #[serde(default)]
    pub occupied_beds: u32,
}

impl HospitalNode {
    pub fn new(id: HospitalId, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            latitude,
            longitude,
            total_beds: 0,
            icu_beds: 0,
            occupied_beds: 0,
        }
    }

    /// Builder-style capacity setter.
    pub fn with_capacity(mut self, total_beds: u32, icu_beds: u32, occupied_beds: u32) -> Self {
        self.total_beds = total_beds;
        self.icu_beds = icu_beds;
        self.occupied_beds = occupied_beds;
        self
    }

    /// Fraction of general beds in use, `None` when the facility reports no beds.
    pub fn occupancy(&self) -> Option<f64> {
        if self.total_beds == 0 {
            None
        } else {
            Some(self.occupied_beds as f64 / self.total_beds as f64)
        }
    }
}

/// One pre-aggregated hospital-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub hospital_id: HospitalId,
    pub date: NaiveDate,
    #[serde(alias = "case_count")]
    pub flu_positive_count: u32,
    #[serde(default)]
    pub total_visits: u32,
}

impl DailyObservation {
    pub fn new(hospital_id: HospitalId, date: NaiveDate, flu_positive_count: u32) -> Self {
        Self {
            hospital_id,
            date,
            flu_positive_count,
            total_visits: 0,
        }
    }
}

/// Dense date × hospital grid of raw case counts.
///
/// Columns are stored per hospital (`columns[h][t]`), rows are the sorted set
/// of dates seen in the input. Missing hospital-days are zero.
#[derive(Debug, Clone)]
pub struct TimeSeriesMatrix {
    pub dates: Vec<NaiveDate>,
    pub hospital_ids: Vec<HospitalId>,
    pub columns: Vec<Vec<f64>>,
}

impl TimeSeriesMatrix {
    /// Pivot observations into a matrix with one column per registered hospital.
    ///
    /// Hospitals without observations get an all-zero column. Rows for
    /// unregistered hospitals still contribute their dates but no column.
    /// Duplicate hospital-days are summed.
    pub fn from_observations(observations: &[DailyObservation], hospital_ids: &[HospitalId]) -> Self {
        let dates: Vec<NaiveDate> = observations
            .iter()
            .map(|o| o.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let row_of: HashMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        let col_of: HashMap<HospitalId, usize> =
            hospital_ids.iter().enumerate().map(|(i, h)| (*h, i)).collect();

        let mut columns = vec![vec![0.0; dates.len()]; hospital_ids.len()];
        for obs in observations {
            if let (Some(&c), Some(&r)) = (col_of.get(&obs.hospital_id), row_of.get(&obs.date)) {
                columns[c][r] += obs.flu_positive_count as f64;
            }
        }

        Self {
            dates,
            hospital_ids: hospital_ids.to_vec(),
            columns,
        }
    }

    pub fn n_dates(&self) -> usize {
        self.dates.len()
    }

    pub fn n_hospitals(&self) -> usize {
        self.hospital_ids.len()
    }

    pub fn index_of(&self, hospital_id: HospitalId) -> Option<usize> {
        self.hospital_ids.iter().position(|&h| h == hospital_id)
    }

    pub fn column(&self, idx: usize) -> &[f64] {
        &self.columns[idx]
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

/// Per-column zero-mean / unit-variance view of a [`TimeSeriesMatrix`].
#[derive(Debug, Clone)]
pub struct NormalizedMatrix {
    pub columns: Vec<Vec<f64>>,
    /// Column means of the raw matrix.
    pub mean: Vec<f64>,
    /// Column sample standard deviations, with 1.0 substituted for zero or
    /// undefined values.
    pub std: Vec<f64>,
}

impl NormalizedMatrix {
    pub fn from_matrix(matrix: &TimeSeriesMatrix) -> Self {
        let mut columns = Vec::with_capacity(matrix.n_hospitals());
        let mut means = Vec::with_capacity(matrix.n_hospitals());
        let mut stds = Vec::with_capacity(matrix.n_hospitals());

        for col in &matrix.columns {
            let mu = mean(col);
            let sigma = match sample_std(col) {
                Some(s) if s > 0.0 && s.is_finite() => s,
                _ => 1.0,
            };
            let normalized = col
                .iter()
                .map(|x| {
                    let z = (x - mu) / sigma;
                    if z.is_finite() {
                        z
                    } else {
                        0.0
                    }
                })
                .collect();
            columns.push(normalized);
            means.push(mu);
            stds.push(sigma);
        }

        Self {
            columns,
            mean: means,
            std: stds,
        }
    }

    pub fn column(&self, idx: usize) -> &[f64] {
        &self.columns[idx]
    }
}

/// Immutable per-cycle snapshot of the raw and normalized case matrices.
///
/// Built once from a registry and an observation snapshot; downstream stages
/// only borrow it.
#[derive(Debug, Clone)]
pub struct TimeSeriesStore {
    raw: TimeSeriesMatrix,
    normalized: NormalizedMatrix,
}

impl TimeSeriesStore {
    pub fn build(observations: &[DailyObservation], hospital_ids: &[HospitalId]) -> Self {
        let raw = TimeSeriesMatrix::from_observations(observations, hospital_ids);
        let normalized = NormalizedMatrix::from_matrix(&raw);
        tracing::debug!(
            dates = raw.n_dates(),
            hospitals = raw.n_hospitals(),
            "Built time series matrix"
        );
        Self { raw, normalized }
    }

    pub fn raw(&self) -> &TimeSeriesMatrix {
        &self.raw
    }

    pub fn normalized(&self) -> &NormalizedMatrix {
        &self.normalized
    }

    pub fn hospital_ids(&self) -> &[HospitalId] {
        &self.raw.hospital_ids
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.raw.dates
    }

    pub fn is_empty(&self) -> bool {
        self.raw.dates.is_empty()
    }
}
