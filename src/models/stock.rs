use crate::models::ticker::Ticker;
use serde::Serialize;
use std::collections::HashMap;

/// 实时行情快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub ticker: Ticker,
    pub name: String,
    pub price: f64,
    pub prev_close: f64,
    pub change_pct: f64,
    /// 成交额（元）
    pub turnover: f64,
    pub updated_at: String,
}

/// 当日资金净流入（元），按订单规模分档
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapitalFlow {
    pub main: Option<f64>,
    pub super_large: Option<f64>,
    pub large: Option<f64>,
    pub medium: Option<f64>,
    pub small: Option<f64>,
}

/// 单只股票的行情 + 资金流
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockSnapshot {
    pub quote: Quote,
    pub flow: Option<CapitalFlow>,
}

/// 北向资金当日净流入（元）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NorthboundFlow {
    pub shanghai: Option<f64>,
    pub shenzhen: Option<f64>,
    pub total: Option<f64>,
    pub updated_at: String,
}

/// 一次批处理共享的只读行情数据
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    pub snapshots: HashMap<Ticker, StockSnapshot>,
    pub northbound: Option<NorthboundFlow>,
}

impl MarketData {
    pub fn snapshot(&self, ticker: &Ticker) -> Option<&StockSnapshot> {
        self.snapshots.get(ticker)
    }
}
