use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::error::{OutbreakError, Result};

/// Real-valued compartment state with fixed total population `n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SirState {
    pub s: f64,
    pub i: f64,
    pub r: f64,
    pub n: f64,
}

impl SirState {
    pub fn total(&self) -> f64 {
        self.s + self.i + self.r
    }
}

/// One projected day, rounded for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SirSnapshot {
    pub day: usize,
    pub susceptible: i64,
    pub infected: i64,
    pub recovered: i64,
}

/// Discrete-time SIR projection with an intervention knob.
#[derive(Debug, Clone)]
pub struct SirModel {
    pub cfg: SimulationConfig,
    pub initial: SirState,
}

impl SirModel {
    /// Start from current infected/recovered counts; everyone else is susceptible.
    pub fn new(infected: f64, recovered: f64, population: f64, cfg: SimulationConfig) -> Result<Self> {
        let valid = infected >= 0.0
            && recovered >= 0.0
            && population > 0.0
            && infected + recovered <= population
            && [infected, recovered, population].iter().all(|v| v.is_finite());
        if !valid {
            return Err(OutbreakError::InvalidPopulation {
                infected,
                recovered,
                population,
            });
        }
        cfg.check()?;
        Ok(Self {
            cfg,
            initial: SirState {
                s: population - infected - recovered,
                i: infected,
                r: recovered,
                n: population,
            },
        })
    }

    /// Transmission rate after intervention, `beta * (1 - factor * max_reduction)`.
    ///
    /// `factor` is clamped to [0, 1].
    pub fn effective_beta(&self, intervention_factor: f64) -> f64 {
        let factor = if intervention_factor.is_finite() {
            intervention_factor.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.cfg.beta * (1.0 - factor * self.cfg.max_reduction)
    }

    /// One forward-Euler day. `I` is floored at 0 after the update.
    pub fn step(&self, state: SirState, beta: f64) -> SirState {
        let infections = beta * state.s * state.i / state.n;
        let recoveries = self.cfg.gamma * state.i;
        SirState {
            s: state.s - infections,
            i: (state.i + infections - recoveries).max(0.0),
            r: state.r + recoveries,
            n: state.n,
        }
    }

    /// Real-valued trajectory for days `1..=days`.
    pub fn trajectory(&self, days: usize, intervention_factor: f64) -> Vec<SirState> {
        let beta = self.effective_beta(intervention_factor);
        let mut state = self.initial;
        let mut out = Vec::with_capacity(days);
        for _ in 0..days {
            state = self.step(state, beta);
            out.push(state);
        }
        out
    }

    /// Day-indexed projection rounded to whole people.
    pub fn project(&self, days: usize, intervention_factor: f64) -> Vec<SirSnapshot> {
        self.trajectory(days, intervention_factor)
            .into_iter()
            .enumerate()
            .map(|(d, st)| SirSnapshot {
                day: d + 1,
                susceptible: st.s.round() as i64,
                infected: st.i.round() as i64,
                recovered: st.r.round() as i64,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> SirModel {
        SirModel::new(1_000.0, 0.0, 1_000_000.0, SimulationConfig::default()).unwrap()
    }

    #[test]
    fn test_first_step_hand_computed() {
        // S=999000, I=1000, N=1e6, beta=0.3, gamma=0.1
        // infections = 0.3 * 999000 * 1000 / 1e6 = 299.7, recoveries = 100
        let m = model();
        let st = m.step(m.initial, m.effective_beta(0.0));
        assert!((st.s - 998_700.3).abs() < 1e-6);
        assert!((st.i - 1_199.7).abs() < 1e-6);
        assert!((st.r - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_conservation() {
        let m = model();
        for st in m.trajectory(200, 0.3) {
            assert!((st.total() - 1_000_000.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_intervention_caps_at_seventy_percent() {
        let m = model();
        assert!((m.effective_beta(1.0) - 0.09).abs() < 1e-12);
        assert!((m.effective_beta(5.0) - 0.09).abs() < 1e-12);
        assert!((m.effective_beta(-1.0) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_intervention_flattens_peak() {
        let m = model();
        let peak = |f: f64| m.project(120, f).iter().map(|s| s.infected).max().unwrap();
        assert!(peak(0.8) < peak(0.0));
    }

    #[test]
    fn test_days_are_one_indexed() {
        let p = model().project(3, 0.0);
        assert_eq!(p.iter().map(|s| s.day).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_rejects_overfull_population() {
        assert!(SirModel::new(600.0, 500.0, 1_000.0, SimulationConfig::default()).is_err());
        assert!(SirModel::new(-1.0, 0.0, 1_000.0, SimulationConfig::default()).is_err());
    }
}
