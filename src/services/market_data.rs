use crate::errors::{FeedError, Result};
use crate::models::stock::{MarketData, StockSnapshot};
use crate::models::ticker::Ticker;
use crate::scrapers::base::MarketDataSource;
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// 行情获取服务：对全部用户的股票并集只请求一次
pub struct MarketDataFetcher {
    source: Arc<dyn MarketDataSource + Send + Sync>,
}

impl MarketDataFetcher {
    pub fn new(source: Arc<dyn MarketDataSource + Send + Sync>) -> Self {
        Self { source }
    }

    /// 获取股票快照与北向资金
    ///
    /// 单只股票缺失只记录警告；股票列表非空而一只都没拿到时返回 `DataUnavailable`。
    pub async fn fetch(&self, universe: &[Ticker]) -> Result<MarketData> {
        let mut seen = HashSet::new();
        let tickers: Vec<Ticker> = universe
            .iter()
            .filter(|t| seen.insert((*t).clone()))
            .cloned()
            .collect();

        info!("Fetching {} tickers from {}", tickers.len(), self.source.source_name());

        let mut market = MarketData::default();

        if !tickers.is_empty() {
            let mut quotes = self
                .source
                .fetch_quotes(&tickers)
                .await
                .map_err(|e| FeedError::DataUnavailable(format!("quote request failed: {}", e)))?;

            let mut flows = match self.source.fetch_capital_flows(&tickers).await {
                Ok(flows) => flows,
                Err(e) => {
                    warn!("Capital flow request failed, feeds will show no flow data: {}", e);
                    Default::default()
                }
            };

            for ticker in &tickers {
                match quotes.remove(ticker) {
                    Some(quote) => {
                        let flow = flows.remove(ticker);
                        if flow.is_none() {
                            warn!("No capital flow for {}", ticker);
                        }
                        market.snapshots.insert(ticker.clone(), StockSnapshot { quote, flow });
                    }
                    None => warn!("No quote for {}, omitting", ticker),
                }
            }

            if market.snapshots.is_empty() {
                return Err(FeedError::DataUnavailable(format!(
                    "none of {} tickers returned data",
                    tickers.len()
                )));
            }
        }

        market.northbound = match self.source.fetch_northbound().await {
            Ok(flow) => Some(flow),
            Err(e) => {
                warn!("Northbound flow unavailable: {}", e);
                None
            }
        };

        info!(
            "Fetched {}/{} snapshots, northbound {}",
            market.snapshots.len(),
            tickers.len(),
            if market.northbound.is_some() { "ok" } else { "missing" }
        );
        Ok(market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stock::{CapitalFlow, NorthboundFlow, Quote};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSource {
        known: Vec<&'static str>,
        fail_quotes: bool,
        fail_flows: bool,
        fail_northbound: bool,
        requested: Mutex<Vec<Vec<Ticker>>>,
    }

    fn quote(ticker: &Ticker) -> Quote {
        Quote {
            ticker: ticker.clone(),
            name: "测试".to_string(),
            price: 10.0,
            prev_close: 9.9,
            change_pct: 1.01,
            turnover: 1e8,
            updated_at: "2025-09-01 15:00:00".to_string(),
        }
    }

    #[async_trait]
    impl MarketDataSource for FakeSource {
        fn source_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_quotes(&self, tickers: &[Ticker]) -> Result<HashMap<Ticker, Quote>> {
            self.requested.lock().unwrap().push(tickers.to_vec());
            if self.fail_quotes {
                return Err(FeedError::DataError("down".to_string()));
            }
            Ok(tickers
                .iter()
                .filter(|t| self.known.iter().any(|k| *k == t.to_string()))
                .map(|t| (t.clone(), quote(t)))
                .collect())
        }

        async fn fetch_capital_flows(&self, tickers: &[Ticker]) -> Result<HashMap<Ticker, CapitalFlow>> {
            if self.fail_flows {
                return Err(FeedError::DataError("down".to_string()));
            }
            Ok(tickers
                .iter()
                .map(|t| (t.clone(), CapitalFlow { main: Some(1e6), ..Default::default() }))
                .collect())
        }

        async fn fetch_northbound(&self) -> Result<NorthboundFlow> {
            if self.fail_northbound {
                return Err(FeedError::DataError("closed".to_string()));
            }
            Ok(NorthboundFlow {
                shanghai: Some(1e8),
                shenzhen: Some(2e8),
                total: Some(3e8),
                updated_at: "2025-09-01".to_string(),
            })
        }
    }

    fn tickers(codes: &[&str]) -> Vec<Ticker> {
        codes.iter().map(|c| Ticker::parse(c).unwrap()).collect()
    }

    #[tokio::test]
    async fn dedups_and_omits_missing_tickers() {
        let source = Arc::new(FakeSource {
            known: vec!["sh600519"],
            ..Default::default()
        });
        let fetcher = MarketDataFetcher::new(source.clone());

        let market = fetcher
            .fetch(&tickers(&["sh600519", "sz000001", "600519"]))
            .await
            .unwrap();

        assert_eq!(source.requested.lock().unwrap()[0].len(), 2);
        assert_eq!(market.snapshots.len(), 1);
        assert!(market.snapshot(&Ticker::parse("sh600519").unwrap()).unwrap().flow.is_some());
        assert!(market.northbound.is_some());
    }

    #[tokio::test]
    async fn keeps_quotes_when_flows_and_northbound_fail() {
        let source = Arc::new(FakeSource {
            known: vec!["sh600519"],
            fail_flows: true,
            fail_northbound: true,
            ..Default::default()
        });
        let market = MarketDataFetcher::new(source).fetch(&tickers(&["sh600519"])).await.unwrap();
        assert!(market.snapshot(&Ticker::parse("sh600519").unwrap()).unwrap().flow.is_none());
        assert!(market.northbound.is_none());
    }

    #[tokio::test]
    async fn fails_when_every_ticker_is_missing() {
        let source = Arc::new(FakeSource::default());
        let err = MarketDataFetcher::new(source).fetch(&tickers(&["sh600519"])).await.unwrap_err();
        assert!(matches!(err, FeedError::DataUnavailable(_)));

        let source = Arc::new(FakeSource {
            known: vec!["sh600519"],
            fail_quotes: true,
            ..Default::default()
        });
        let err = MarketDataFetcher::new(source).fetch(&tickers(&["sh600519"])).await.unwrap_err();
        assert!(matches!(err, FeedError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn empty_universe_only_fetches_northbound() {
        let source = Arc::new(FakeSource::default());
        let market = MarketDataFetcher::new(source.clone()).fetch(&[]).await.unwrap();
        assert!(market.snapshots.is_empty());
        assert!(market.northbound.is_some());
        assert!(source.requested.lock().unwrap().is_empty());
    }
}
