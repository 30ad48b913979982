use crate::models::stock::{CapitalFlow, NorthboundFlow, Quote};
use crate::models::ticker::Ticker;
use crate::errors::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Upstream market data provider.
///
/// Batch methods return only the tickers the provider could answer for;
/// an `Err` means the whole call failed.
#[async_trait]
pub trait MarketDataSource {
    /// Name used in log lines
    fn source_name(&self) -> &'static str;

    /// Fetch real-time quotes for the given tickers
    async fn fetch_quotes(&self, tickers: &[Ticker]) -> Result<HashMap<Ticker, Quote>>;

    /// Fetch today's net inflow by order size for the given tickers
    async fn fetch_capital_flows(&self, tickers: &[Ticker]) -> Result<HashMap<Ticker, CapitalFlow>>;

    /// Fetch today's northbound (Stock Connect) net flow
    async fn fetch_northbound(&self) -> Result<NorthboundFlow>;
}
