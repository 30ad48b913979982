use crate::errors::{FeedError, Result};
use serde::Serialize;
use std::fmt;

/// 交易所
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Exchange {
    Shanghai,
    Shenzhen,
    Beijing,
}

impl Exchange {
    /// 代码前缀，如 `sh`
    pub fn prefix(&self) -> &'static str {
        match self {
            Exchange::Shanghai => "sh",
            Exchange::Shenzhen => "sz",
            Exchange::Beijing => "bj",
        }
    }

    /// 东方财富 secid 中的市场编号
    pub fn eastmoney_market(&self) -> u8 {
        match self {
            Exchange::Shanghai => 1,
            Exchange::Shenzhen | Exchange::Beijing => 0,
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "sh" => Some(Exchange::Shanghai),
            "sz" => Some(Exchange::Shenzhen),
            "bj" => Some(Exchange::Beijing),
            _ => None,
        }
    }

    /// 按代码首位推断交易所，只处理沪深主板/创业板/科创板
    fn infer(code: &str) -> Option<Self> {
        match code.as_bytes().first() {
            Some(b'6') => Some(Exchange::Shanghai),
            Some(b'0') | Some(b'3') => Some(Exchange::Shenzhen),
            _ => None,
        }
    }
}

/// 规范化后的股票代码，显示为 `sh600519`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Ticker {
    pub exchange: Exchange,
    pub code: String,
}

impl Ticker {
    /// Parses `sh600519`, `SZ000001`, `600519.SH` or a bare six-digit code.
    ///
    /// Bare codes are mapped by their first digit (6 → Shanghai, 0/3 → Shenzhen);
    /// anything else is rejected instead of guessed.
    pub fn parse(raw: &str) -> Result<Self> {
        let s = raw.trim().to_ascii_lowercase();
        if s.is_empty() {
            return Err(FeedError::InvalidTicker("empty ticker".to_string()));
        }

        let (exchange, code) = if let Some((code, suffix)) = s.split_once('.') {
            let exchange = Exchange::from_prefix(suffix)
                .ok_or_else(|| FeedError::InvalidTicker(format!("{}: unknown exchange suffix", raw.trim())))?;
            (Some(exchange), code.to_string())
        } else if s.as_bytes().first().map_or(false, u8::is_ascii_alphabetic) {
            // 前两个字节必须都是 ASCII 字母，否则 split_at 会切在多字节字符中间
            if s.len() <= 2 || !s.as_bytes()[..2].iter().all(u8::is_ascii_alphabetic) {
                return Err(FeedError::InvalidTicker(format!("{}: unknown exchange prefix", raw.trim())));
            }
            let (prefix, code) = s.split_at(2);
            let exchange = Exchange::from_prefix(prefix)
                .ok_or_else(|| FeedError::InvalidTicker(format!("{}: unknown exchange prefix", raw.trim())))?;
            (Some(exchange), code.to_string())
        } else {
            (None, s.clone())
        };

        if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FeedError::InvalidTicker(format!("{}: code must be six digits", raw.trim())));
        }

        let exchange = match exchange {
            Some(exchange) => exchange,
            None => Exchange::infer(&code).ok_or_else(|| {
                FeedError::InvalidTicker(format!("{}: cannot infer exchange, add an sh/sz/bj prefix", raw.trim()))
            })?,
        };

        Ok(Self { exchange, code })
    }

    /// 东方财富接口使用的 secid，如 `1.600519`
    pub fn eastmoney_secid(&self) -> String {
        format!("{}.{}", self.exchange.eastmoney_market(), self.code)
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.exchange.prefix(), self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_exchange_for_bare_codes() {
        assert_eq!(Ticker::parse("600519").unwrap().to_string(), "sh600519");
        assert_eq!(Ticker::parse("000001").unwrap().to_string(), "sz000001");
        assert_eq!(Ticker::parse("300750").unwrap().to_string(), "sz300750");
    }

    #[test]
    fn keeps_explicit_prefix_and_suffix() {
        assert_eq!(Ticker::parse("SH600519").unwrap().to_string(), "sh600519");
        assert_eq!(Ticker::parse(" sz000858 ").unwrap().to_string(), "sz000858");
        assert_eq!(Ticker::parse("600036.SH").unwrap().to_string(), "sh600036");
        assert_eq!(Ticker::parse("bj830799").unwrap().exchange, Exchange::Beijing);
    }

    #[test]
    fn rejects_unrecognized_codes() {
        assert!(matches!(Ticker::parse("830799"), Err(FeedError::InvalidTicker(_))));
        assert!(matches!(Ticker::parse("hk00700"), Err(FeedError::InvalidTicker(_))));
        assert!(Ticker::parse("60051").is_err());
        assert!(Ticker::parse("sh60051x").is_err());
        assert!(Ticker::parse("").is_err());
    }

    #[test]
    fn rejects_non_ascii_prefix_without_panicking() {
        assert!(matches!(Ticker::parse("s茅台"), Err(FeedError::InvalidTicker(_))));
        assert!(matches!(Ticker::parse("茅台"), Err(FeedError::InvalidTicker(_))));
        assert!(matches!(Ticker::parse("s"), Err(FeedError::InvalidTicker(_))));
        assert!(matches!(Ticker::parse("sh茅台酒"), Err(FeedError::InvalidTicker(_))));
    }

    #[test]
    fn builds_eastmoney_secid() {
        assert_eq!(Ticker::parse("sh600519").unwrap().eastmoney_secid(), "1.600519");
        assert_eq!(Ticker::parse("sz000001").unwrap().eastmoney_secid(), "0.000001");
    }
}
