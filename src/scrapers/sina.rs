//! 新浪财经实时行情
//!
//! 对接 https://hq.sinajs.cn/list=sh600519,sz000001 ，一次请求返回多只股票

use crate::errors::Result;
use crate::models::stock::Quote;
use crate::models::ticker::Ticker;
use crate::scrapers::http::HttpFetcher;
use log::{debug, warn};
use std::collections::HashMap;

pub const SINA_QUOTE_API: &str = "https://hq.sinajs.cn/list=";

/// 批量获取实时行情
pub async fn fetch_quotes(http: &HttpFetcher, tickers: &[Ticker]) -> Result<HashMap<Ticker, Quote>> {
    if tickers.is_empty() {
        return Ok(HashMap::new());
    }

    let list = tickers.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(",");
    let url = format!("{}{}", SINA_QUOTE_API, list);
    debug!("请求新浪行情: {}", url);

    let bytes = http
        .get_bytes(|client| client.get(&url).header("Referer", "https://finance.sina.com.cn/"))
        .await?;
    let text = encoding_rs::GBK.decode(&bytes).0;

    Ok(parse_sina_quotes(&text, tickers))
}

/// 解析新浪行情，每行格式:
/// `var hq_str_sh600519="贵州茅台,开盘,昨收,现价,最高,最低,...,成交量,成交额,...,日期,时间,...";`
pub fn parse_sina_quotes(text: &str, tickers: &[Ticker]) -> HashMap<Ticker, Quote> {
    let wanted: HashMap<String, &Ticker> = tickers.iter().map(|t| (t.to_string(), t)).collect();
    let mut quotes = HashMap::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((lhs, rhs)) = line.split_once('=') else { continue };
        let symbol = lhs.trim().trim_start_matches("var hq_str_");
        let Some(ticker) = wanted.get(symbol) else { continue };

        let content = rhs.trim().trim_end_matches(';').trim_matches('"');
        if content.is_empty() {
            warn!("新浪行情无数据: {}", symbol);
            continue;
        }

        let fields: Vec<&str> = content.split(',').collect();
        if fields.len() < 32 {
            warn!("新浪行情字段不足: {} ({} fields)", symbol, fields.len());
            continue;
        }

        let num = |i: usize| fields[i].trim().parse::<f64>().unwrap_or(0.0);
        let prev_close = num(2);
        let mut price = num(3);
        // 集合竞价前或停牌时现价为 0
        if price <= 0.0 {
            price = prev_close;
        }
        let change_pct = if prev_close > 0.0 {
            (price - prev_close) / prev_close * 100.0
        } else {
            0.0
        };

        quotes.insert(
            (*ticker).clone(),
            Quote {
                ticker: (*ticker).clone(),
                name: fields[0].trim().to_string(),
                price,
                prev_close,
                change_pct,
                turnover: num(9),
                updated_at: format!("{} {}", fields[30], fields[31]),
            },
        );
    }

    quotes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sina_line(symbol: &str, name: &str, prev_close: &str, price: &str, amount: &str) -> String {
        let mut fields = vec!["0".to_string(); 33];
        fields[0] = name.to_string();
        fields[1] = prev_close.to_string();
        fields[2] = prev_close.to_string();
        fields[3] = price.to_string();
        fields[9] = amount.to_string();
        fields[30] = "2025-09-01".to_string();
        fields[31] = "15:00:00".to_string();
        format!("var hq_str_{}=\"{}\";", symbol, fields.join(","))
    }

    #[test]
    fn parses_batched_response() {
        let tickers = vec![
            Ticker::parse("sh600519").unwrap(),
            Ticker::parse("sz000001").unwrap(),
            Ticker::parse("sz300750").unwrap(),
        ];
        let text = format!(
            "{}\n{}\nvar hq_str_sz300750=\"\";\n",
            sina_line("sh600519", "贵州茅台", "1000.00", "1012.30", "5123456789.000"),
            sina_line("sz000001", "平安银行", "10.00", "0.000", "0"),
        );

        let quotes = parse_sina_quotes(&text, &tickers);
        assert_eq!(quotes.len(), 2);

        let moutai = &quotes[&tickers[0]];
        assert_eq!(moutai.name, "贵州茅台");
        assert!((moutai.change_pct - 1.23).abs() < 1e-9);
        assert_eq!(moutai.turnover, 5_123_456_789.0);
        assert_eq!(moutai.updated_at, "2025-09-01 15:00:00");

        let pingan = &quotes[&tickers[1]];
        assert_eq!(pingan.price, 10.0);
        assert_eq!(pingan.change_pct, 0.0);

        assert!(!quotes.contains_key(&tickers[2]));
    }

    #[test]
    fn ignores_unrequested_and_short_records() {
        let tickers = vec![Ticker::parse("sh600036").unwrap()];
        let text = "var hq_str_sh600036=\"招商银行,1,2\";\nvar hq_str_sh600000=\"浦发银行\";";
        assert!(parse_sina_quotes(text, &tickers).is_empty());
    }
}
