pub mod cache;
pub mod distance_matrix;
pub mod distance_metric;
pub mod partition;
pub mod series;
