use thiserror::Error;

use crate::core::series::HospitalId;

/// Errors surfaced at configuration, IO and model-fit boundaries.
///
/// Degenerate numeric input (empty or constant series, single-sample columns)
/// never produces an error; it resolves to a neutral value instead.
#[derive(Error, Debug)]
pub enum OutbreakError {
    #[error("Unknown hospital: {0}")]
    UnknownHospital(HospitalId),

    #[error("Invalid population: infected ({infected}) + recovered ({recovered}) exceeds population ({population})")]
    InvalidPopulation {
        infected: f64,
        recovered: f64,
        population: f64,
    },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Forecast model diverged: {0}")]
    ForecastDiverged(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OutbreakError>;
