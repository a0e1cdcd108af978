//! Operational checks that sit on top of the mining pipeline.

pub mod alerts;
pub mod integrity;
