pub mod common;
pub mod distance;
pub mod forecast;
pub mod holt;
pub mod linkage;
pub mod sir;
pub mod spread;
