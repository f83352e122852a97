pub mod codebook;
pub mod danger;
pub mod error;
pub mod problem;
pub mod record;
pub mod region;
pub mod spatial;
