use chrono::{DateTime, Utc};
use chrono_tz::Asia::Shanghai;
use chrono_tz::Tz;

const YI: f64 = 1e8;
const WAN: f64 = 1e4;

/// 当前北京时间
pub fn beijing_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&Shanghai)
}

// "2.30" -> "2.3", "2.00" -> "2"
fn trim_decimals(s: String) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// 先舍入再选单位：99_999_999 → 1亿 而不是 10000万
fn scaled(value: f64) -> String {
    let abs = value.abs();
    let wan = round2(abs / WAN);
    if abs >= YI || wan >= 10000.0 {
        format!("{}亿", trim_decimals(format!("{:.2}", round2(abs / YI))))
    } else if abs.round() >= WAN {
        format!("{}万", trim_decimals(format!("{:.2}", wan)))
    } else {
        format!("{:.0}元", abs)
    }
}

/// 金额（元）转为 亿/万 表示，不带符号
pub fn fmt_amount(value: f64) -> String {
    let s = scaled(value);
    if value < 0.0 && s != "0元" {
        format!("-{}", s)
    } else {
        s
    }
}

/// 净流入金额，正数带 `+` 号，如 `+2.3亿`
pub fn fmt_signed_amount(value: f64) -> String {
    let s = scaled(value);
    if s == "0元" {
        s
    } else if value > 0.0 {
        format!("+{}", s)
    } else {
        format!("-{}", s)
    }
}

pub fn fmt_opt_signed_amount(value: Option<f64>) -> String {
    value.map(fmt_signed_amount).unwrap_or_else(|| "—".to_string())
}

/// 涨跌幅，两位小数带符号
pub fn fmt_pct(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0.00%".to_string()
    } else {
        format!("{:+.2}%", rounded)
    }
}

/// 资金方向
pub fn flow_direction(value: Option<f64>) -> &'static str {
    match value {
        Some(v) if v > 0.0 => "↑流入",
        Some(v) if v < 0.0 => "↓流出",
        _ => "—",
    }
}
