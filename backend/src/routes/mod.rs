pub mod analysis;
pub mod baseline;
pub mod charts;
