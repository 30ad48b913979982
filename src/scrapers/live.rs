use crate::config::NetworkSettings;
use crate::errors::Result;
use crate::models::stock::{CapitalFlow, NorthboundFlow, Quote};
use crate::models::ticker::Ticker;
use crate::scrapers::base::MarketDataSource;
use crate::scrapers::http::HttpFetcher;
use crate::scrapers::{eastmoney, sina};
use async_trait::async_trait;
use std::collections::HashMap;

/// 线上数据源：新浪行情 + 东方财富资金流/北向资金
pub struct LiveSource {
    http: HttpFetcher,
}

impl LiveSource {
    pub fn new(settings: &NetworkSettings) -> Result<Self> {
        Ok(Self {
            http: HttpFetcher::new(settings)?,
        })
    }
}

#[async_trait]
impl MarketDataSource for LiveSource {
    fn source_name(&self) -> &'static str {
        "sina+eastmoney"
    }

    async fn fetch_quotes(&self, tickers: &[Ticker]) -> Result<HashMap<Ticker, Quote>> {
        sina::fetch_quotes(&self.http, tickers).await
    }

    async fn fetch_capital_flows(&self, tickers: &[Ticker]) -> Result<HashMap<Ticker, CapitalFlow>> {
        eastmoney::fetch_capital_flows(&self.http, tickers).await
    }

    async fn fetch_northbound(&self) -> Result<NorthboundFlow> {
        eastmoney::fetch_northbound(&self.http).await
    }
}
