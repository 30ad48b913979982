pub mod batch;
pub mod feed_builder;
pub mod market_data;
