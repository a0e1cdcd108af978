pub mod acf;
pub mod correlation;
pub mod dtw;
pub mod euclidean;
pub mod spatial;
