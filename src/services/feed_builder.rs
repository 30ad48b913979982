//! 单个用户的 RSS 文档构建
//!
//! `build_feed` 是纯函数：相同的输入（包括 `now`）产生相同的 XML。

use crate::config::{GlobalDefaults, UserConfig};
use crate::errors::{FeedError, Result};
use crate::models::stock::{MarketData, NorthboundFlow, StockSnapshot};
use crate::models::ticker::Ticker;
use crate::util::{flow_direction, fmt_amount, fmt_opt_signed_amount, fmt_pct};
use chrono::DateTime;
use chrono_tz::Tz;
use rss::{Channel, Guid, Item};

/// RSS 条目
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub guid: String,
    pub description: String,
    pub pub_date: DateTime<Tz>,
}

/// 一个用户的订阅文档
#[derive(Debug, Clone, PartialEq)]
pub struct FeedDocument {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub ttl: u32,
    pub last_build_date: DateTime<Tz>,
    pub items: Vec<FeedItem>,
}

impl FeedDocument {
    pub fn to_channel(&self) -> Channel {
        let items = self
            .items
            .iter()
            .map(|it| {
                let mut guid = Guid::default();
                guid.set_value(it.guid.clone());
                guid.set_permalink(false);

                let mut item = Item::default();
                item.set_title(Some(it.title.clone()));
                item.set_link(Some(it.link.clone()));
                item.set_guid(Some(guid));
                item.set_description(Some(it.description.clone()));
                item.set_pub_date(Some(it.pub_date.to_rfc2822()));
                item
            })
            .collect::<Vec<_>>();

        let mut channel = Channel::default();
        channel.set_title(self.title.clone());
        channel.set_link(self.link.clone());
        channel.set_description(self.description.clone());
        channel.set_language(Some(self.language.clone()));
        channel.set_ttl(Some(self.ttl.to_string()));
        channel.set_last_build_date(Some(self.last_build_date.to_rfc2822()));
        channel.set_items(items);
        channel
    }

    /// 序列化为 RSS 2.0 XML
    pub fn to_rss_string(&self) -> Result<String> {
        let buf = self.to_channel().pretty_write_to(Vec::new(), b' ', 2)?;
        String::from_utf8(buf).map_err(|e| FeedError::DataError(e.to_string()))
    }
}

/// 雪球个股页
fn quote_link(ticker: &Ticker) -> String {
    format!("https://xueqiu.com/S/{}", ticker.to_string().to_uppercase())
}

fn stock_item(ticker: &Ticker, snapshot: &StockSnapshot) -> (String, String) {
    let q = &snapshot.quote;
    let name = if q.name.is_empty() { ticker.to_string() } else { q.name.clone() };
    let title = format!("{} {} {:.2}（{}）", ticker, name, q.price, fmt_pct(q.change_pct));

    let flow_line = match &snapshot.flow {
        Some(f) => {
            let bucket = |label: &str, v: Option<f64>| {
                format!("{} {}（{}）", label, fmt_opt_signed_amount(v), flow_direction(v))
            };
            format!(
                "<p>资金净流入：{} | {} | {} | {} | {}</p>",
                bucket("主力", f.main),
                bucket("超大单", f.super_large),
                bucket("大单", f.large),
                bucket("中单", f.medium),
                bucket("小单", f.small),
            )
        }
        None => "<p>资金净流入：暂无数据</p>".to_string(),
    };

    let description = format!(
        "<p><b>{}（{}）</b></p><p>最新价：{:.2}　涨跌幅：{}　成交额：{}</p>{}<p>行情时间：{}</p>",
        name,
        ticker,
        q.price,
        fmt_pct(q.change_pct),
        fmt_amount(q.turnover),
        flow_line,
        q.updated_at,
    );
    (title, description)
}

fn placeholder_item(ticker: &Ticker) -> (String, String) {
    (
        format!("{}（行情暂不可用）", ticker),
        format!("<p>{} 行情与资金流数据暂不可用，下次更新时自动重试。</p>", ticker),
    )
}

fn northbound_item(northbound: Option<&NorthboundFlow>, stock_count: usize, now: &DateTime<Tz>) -> (String, String) {
    let (title, line) = match northbound.filter(|n| n.total.is_some()) {
        Some(n) => (
            format!("北向资金 合计 {}", fmt_opt_signed_amount(n.total)),
            format!(
                "北向资金｜沪股通 {}｜深股通 {}｜合计 {}｜数据日期 {}",
                fmt_opt_signed_amount(n.shanghai),
                fmt_opt_signed_amount(n.shenzhen),
                fmt_opt_signed_amount(n.total),
                if n.updated_at.is_empty() { "—" } else { n.updated_at.as_str() },
            ),
        ),
        None => (
            "北向资金（暂不可用）".to_string(),
            "北向资金：接口暂不可用 / 闭市".to_string(),
        ),
    };

    let description = format!(
        "<ul><li>更新时间：{}</li><li>{}</li><li>覆盖股票数：{}</li></ul>",
        now.format("%Y-%m-%d %H:%M:%S"),
        line,
        stock_count,
    );
    (title, description)
}

/// 为单个用户构建订阅文档：每只股票一个条目，外加一个北向资金条目
pub fn build_feed(user: &UserConfig, market: &MarketData, defaults: &GlobalDefaults, now: DateTime<Tz>) -> FeedDocument {
    let day = now.format("%Y%m%d").to_string();
    let mut items = Vec::with_capacity(user.stocks.len() + 1);

    for ticker in &user.stocks {
        let (title, description) = match market.snapshot(ticker) {
            Some(snapshot) => stock_item(ticker, snapshot),
            None => placeholder_item(ticker),
        };
        items.push(FeedItem {
            title,
            link: quote_link(ticker),
            guid: format!("{}-{}-{}", user.user_id, ticker, day),
            description,
            pub_date: now,
        });
    }

    let (title, description) = northbound_item(market.northbound.as_ref(), user.stocks.len(), &now);
    items.push(FeedItem {
        title,
        link: defaults.site_link.clone(),
        guid: format!("{}-northbound-{}", user.user_id, day),
        description,
        pub_date: now,
    });

    FeedDocument {
        title: user.title.clone(),
        link: defaults.site_link.clone(),
        description: defaults.description.clone(),
        language: defaults.language.clone(),
        ttl: defaults.ttl,
        last_build_date: now,
        items,
    }
}
