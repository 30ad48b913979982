// 公开导出的模块，供外部使用
pub mod models;
pub mod config;
pub mod errors;
pub mod services;
pub mod scrapers;

#[doc(hidden)]
pub mod util;

// 重新导出常用类型，方便使用
pub use config::{Config, GlobalDefaults, UserConfig};
pub use errors::{Result, FeedError};
pub use models::stock::{CapitalFlow, MarketData, NorthboundFlow, Quote, StockSnapshot};
pub use models::ticker::{Exchange, Ticker};
pub use scrapers::base::MarketDataSource;
pub use services::batch::{BatchRunner, BatchSummary};
pub use services::feed_builder::{build_feed, FeedDocument, FeedItem};
