pub mod base;
pub mod eastmoney;
pub mod http;
pub mod live;
pub mod sina;
