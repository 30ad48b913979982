pub mod stock;
pub mod ticker;
