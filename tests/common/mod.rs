use async_trait::async_trait;
use stock_rss::errors::{FeedError, Result};
use stock_rss::{CapitalFlow, MarketDataSource, NorthboundFlow, Quote, Ticker};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 固定数据的行情源
#[derive(Default)]
pub struct StaticSource {
    pub quotes: HashMap<String, (String, f64, f64)>,
    pub flows: HashMap<String, f64>,
    pub northbound: Option<NorthboundFlow>,
    pub quote_calls: AtomicUsize,
}

impl StaticSource {
    pub fn with_quote(mut self, ticker: &str, name: &str, price: f64, change_pct: f64) -> Self {
        self.quotes.insert(ticker.to_string(), (name.to_string(), price, change_pct));
        self
    }

    pub fn with_main_inflow(mut self, ticker: &str, yuan: f64) -> Self {
        self.flows.insert(ticker.to_string(), yuan);
        self
    }

    pub fn with_northbound(mut self, total: f64) -> Self {
        self.northbound = Some(NorthboundFlow {
            shanghai: Some(total / 2.0),
            shenzhen: Some(total / 2.0),
            total: Some(total),
            updated_at: "2025-09-01".to_string(),
        });
        self
    }

    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataSource for StaticSource {
    fn source_name(&self) -> &'static str {
        "static"
    }

    async fn fetch_quotes(&self, tickers: &[Ticker]) -> Result<HashMap<Ticker, Quote>> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        Ok(tickers
            .iter()
            .filter_map(|t| {
                self.quotes.get(&t.to_string()).map(|(name, price, pct)| {
                    (
                        t.clone(),
                        Quote {
                            ticker: t.clone(),
                            name: name.clone(),
                            price: *price,
                            prev_close: price / (1.0 + pct / 100.0),
                            change_pct: *pct,
                            turnover: 1.5e9,
                            updated_at: "2025-09-01 14:59:58".to_string(),
                        },
                    )
                })
            })
            .collect())
    }

    async fn fetch_capital_flows(&self, tickers: &[Ticker]) -> Result<HashMap<Ticker, CapitalFlow>> {
        Ok(tickers
            .iter()
            .filter_map(|t| {
                self.flows.get(&t.to_string()).map(|main| {
                    (
                        t.clone(),
                        CapitalFlow {
                            main: Some(*main),
                            super_large: Some(main * 0.6),
                            large: Some(main * 0.4),
                            medium: Some(-main * 0.3),
                            small: Some(-main * 0.7),
                        },
                    )
                })
            })
            .collect())
    }

    async fn fetch_northbound(&self) -> Result<NorthboundFlow> {
        self.northbound
            .clone()
            .ok_or_else(|| FeedError::DataError("northbound closed".to_string()))
    }
}
