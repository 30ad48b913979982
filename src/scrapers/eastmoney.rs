//! 东方财富资金流向与北向资金
//!
//! - 个股资金流: push2.eastmoney.com/api/qt/ulist.np/get（批量）
//! - 北向资金: push2.eastmoney.com/api/qt/kamt/get

use crate::errors::{FeedError, Result};
use crate::models::stock::{CapitalFlow, NorthboundFlow};
use crate::models::ticker::Ticker;
use crate::scrapers::http::HttpFetcher;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;

pub const EASTMONEY_ULIST_API: &str = "https://push2.eastmoney.com/api/qt/ulist.np/get";
pub const EASTMONEY_KAMT_API: &str = "https://push2.eastmoney.com/api/qt/kamt/get";

// f12 代码, f13 市场, f62 主力, f66 超大单, f72 大单, f78 中单, f84 小单（单位：元）
const FLOW_FIELDS: &str = "f12,f13,f14,f62,f66,f72,f78,f84";

/// 数值字段，接口用 "-" 表示缺失
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// 批量获取个股当日资金净流入
pub async fn fetch_capital_flows(http: &HttpFetcher, tickers: &[Ticker]) -> Result<HashMap<Ticker, CapitalFlow>> {
    if tickers.is_empty() {
        return Ok(HashMap::new());
    }

    let secids = tickers.iter().map(|t| t.eastmoney_secid()).collect::<Vec<_>>().join(",");
    debug!("请求东方财富资金流: {}", secids);

    let bytes = http
        .get_bytes(|client| {
            client
                .get(EASTMONEY_ULIST_API)
                .query(&[("fltt", "2"), ("np", "1"), ("fields", FLOW_FIELDS), ("secids", secids.as_str())])
                .header("Referer", "https://data.eastmoney.com/")
        })
        .await?;

    let json: Value = serde_json::from_slice(&bytes)?;
    parse_capital_flows(&json, tickers)
}

pub fn parse_capital_flows(json: &Value, tickers: &[Ticker]) -> Result<HashMap<Ticker, CapitalFlow>> {
    let rows: Vec<&Value> = match json.pointer("/data/diff") {
        Some(Value::Array(arr)) => arr.iter().collect(),
        Some(Value::Object(map)) => map.values().collect(),
        _ => {
            return Err(FeedError::DataError("资金流响应缺少 data.diff".to_string()));
        }
    };

    let wanted: HashMap<String, &Ticker> = tickers.iter().map(|t| (t.eastmoney_secid(), t)).collect();
    let mut flows = HashMap::new();

    for row in rows {
        let code = row.get("f12").and_then(Value::as_str).unwrap_or_default();
        let market = row.get("f13").and_then(Value::as_u64).unwrap_or_default();
        let Some(ticker) = wanted.get(&format!("{}.{}", market, code)) else {
            debug!("忽略未请求的资金流记录 {}.{}", market, code);
            continue;
        };

        let field = |name: &str| row.get(name).and_then(as_number);
        let flow = CapitalFlow {
            main: field("f62"),
            super_large: field("f66"),
            large: field("f72"),
            medium: field("f78"),
            small: field("f84"),
        };
        if flow == CapitalFlow::default() {
            warn!("资金流全部缺失: {}", ticker);
            continue;
        }
        flows.insert((*ticker).clone(), flow);
    }

    Ok(flows)
}

/// 获取北向资金当日净流入
pub async fn fetch_northbound(http: &HttpFetcher) -> Result<NorthboundFlow> {
    let bytes = http
        .get_bytes(|client| {
            client
                .get(EASTMONEY_KAMT_API)
                .query(&[("fields1", "f1,f2,f3,f4"), ("fields2", "f51,f52,f53,f54,f63")])
                .header("Referer", "https://data.eastmoney.com/hsgt/")
        })
        .await?;

    let json: Value = serde_json::from_slice(&bytes)?;
    parse_northbound(&json)
}

/// `dayNetAmtIn` 单位为万元，这里统一转换为元
pub fn parse_northbound(json: &Value) -> Result<NorthboundFlow> {
    let data = json
        .get("data")
        .filter(|d| d.is_object())
        .ok_or_else(|| FeedError::DataError("北向资金响应缺少 data".to_string()))?;

    let net_in = |channel: &str| {
        data.get(channel)
            .and_then(|c| c.get("dayNetAmtIn"))
            .and_then(as_number)
            .map(|wan| wan * 1e4)
    };
    let shanghai = net_in("hk2sh");
    let shenzhen = net_in("hk2sz");
    let total = match (shanghai, shenzhen) {
        (None, None) => None,
        (sh, sz) => Some(sh.unwrap_or(0.0) + sz.unwrap_or(0.0)),
    };

    let updated_at = data
        .get("hk2sh")
        .and_then(|c| c.get("date"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(NorthboundFlow {
        shanghai,
        shenzhen,
        total,
        updated_at,
    })
}
