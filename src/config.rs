use crate::errors::{FeedError, Result};
use crate::models::ticker::Ticker;
use log::{info, warn};
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const DEFAULT_TITLE_TEMPLATE: &str = "{user_id} 的盯盘";

fn user_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,32}$").expect("valid user_id regex"))
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9]{6,32}$").expect("valid token regex"))
}

/// 网络设置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// 代理地址，如 `http://127.0.0.1:7890`
    pub proxy: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// 单个请求失败后的重试次数
    pub retries: u32,
    /// 两次请求之间的最小间隔（毫秒）
    pub request_interval_ms: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            retries: 2,
            request_interval_ms: 300,
        }
    }
}

/// 全局默认配置（defaults.yaml）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalDefaults {
    /// 用户未填写 title 时使用，`{user_id}` 会被替换
    pub title_template: String,
    pub description: String,
    pub site_link: String,
    pub language: String,
    /// 频道 ttl（分钟）
    pub ttl: u32,
    pub users_dir: PathBuf,
    pub output_dir: PathBuf,
    pub network: NetworkSettings,
}

impl Default for GlobalDefaults {
    fn default() -> Self {
        Self {
            title_template: DEFAULT_TITLE_TEMPLATE.to_string(),
            description: "北向资金 / 主力-大中小单净流入 / 实时涨跌 订阅".to_string(),
            site_link: "https://example.com/".to_string(),
            language: "zh-cn".to_string(),
            ttl: 5,
            users_dir: PathBuf::from("configs/users"),
            output_dir: PathBuf::from("public/feeds"),
            network: NetworkSettings::default(),
        }
    }
}

impl GlobalDefaults {
    /// 从 YAML 文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content)
            .map_err(|e| FeedError::config(path.display().to_string(), e.to_string()))
    }

    /// 文件不存在时使用内置默认值，文件存在但格式错误时报错
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let defaults = Self::from_file(path)?;
            info!("Loaded defaults from {}", path.display());
            Ok(defaults)
        } else {
            info!("Defaults file {} not found, using built-in defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn render_title(&self, user_id: &str) -> String {
        self.title_template.replace("{user_id}", user_id)
    }
}

/// 单个用户的订阅配置
#[derive(Debug, Clone, PartialEq)]
pub struct UserConfig {
    pub user_id: String,
    pub title: String,
    pub stocks: Vec<Ticker>,
    pub token: String,
    pub source: PathBuf,
}

impl UserConfig {
    /// 输出文件名 `<user_id>-<token>.xml`
    pub fn feed_file_name(&self) -> String {
        format!("{}-{}.xml", self.user_id, self.token)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawUserConfig {
    user_id: Option<Value>,
    title: Option<Value>,
    #[serde(default)]
    stocks: Vec<Value>,
    token: Option<Value>,
}

/// YAML 标量转字符串；纯数字的股票代码会丢失前导零，需要补齐
fn scalar_to_string(value: &Value, pad_digits: usize) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => match n.as_u64() {
            Some(u) if pad_digits > 0 => Some(format!("{:0width$}", u, width = pad_digits)),
            _ => Some(n.to_string()),
        },
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// user_id / token 被 YAML 解析成数字时直接拒绝，避免 `0o17`、`1e6` 之类被改写
fn text_field(value: Option<&Value>, field: &str, file: &str) -> Result<String> {
    match value {
        Some(Value::Number(n)) => Err(FeedError::config(
            file,
            format!("{} {} is numeric, quote it as a string (e.g. {}: \"{}\")", field, n, field, n),
        )),
        Some(v) => Ok(scalar_to_string(v, 0).unwrap_or_default()),
        None => Ok(String::new()),
    }
}

/// 解析并校验一个用户配置
pub fn parse_user_config(content: &str, source: &Path, defaults: &GlobalDefaults) -> Result<UserConfig> {
    let file = source.display().to_string();
    let raw: RawUserConfig = serde_yaml::from_str(content)
        .map_err(|e| FeedError::config(&file, format!("invalid YAML: {}", e)))?;

    let user_id = text_field(raw.user_id.as_ref(), "user_id", &file)?;
    if user_id.is_empty() {
        return Err(FeedError::config(&file, "missing user_id"));
    }
    if !user_id_re().is_match(&user_id) {
        return Err(FeedError::config(&file, format!("invalid user_id {:?}", user_id)));
    }

    let token = text_field(raw.token.as_ref(), "token", &file)?;
    if token.is_empty() {
        return Err(FeedError::config(&file, "missing token"));
    }
    if !token_re().is_match(&token) {
        return Err(FeedError::config(&file, "token must be 6-32 letters or digits"));
    }

    let title = raw
        .title
        .as_ref()
        .and_then(|v| scalar_to_string(v, 0))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| defaults.render_title(&user_id));

    let mut stocks = Vec::with_capacity(raw.stocks.len());
    let mut seen = HashSet::new();
    for value in &raw.stocks {
        let text = scalar_to_string(value, 6)
            .ok_or_else(|| FeedError::config(&file, "stocks must be a list of codes"))?;
        let ticker = Ticker::parse(&text).map_err(|e| FeedError::config(&file, e.to_string()))?;
        if seen.insert(ticker.clone()) {
            stocks.push(ticker);
        }
    }

    Ok(UserConfig {
        user_id,
        title,
        stocks,
        token,
        source: source.to_path_buf(),
    })
}

/// 被跳过的配置文件
#[derive(Debug, Clone)]
pub struct SkippedConfig {
    pub file: PathBuf,
    pub reason: String,
}

/// 一次加载的结果
#[derive(Debug, Default)]
pub struct UserConfigSet {
    pub users: Vec<UserConfig>,
    pub skipped: Vec<SkippedConfig>,
}

impl UserConfigSet {
    /// 所有用户引用到的股票（去重，保持首次出现顺序）
    pub fn ticker_universe(&self) -> Vec<Ticker> {
        let mut seen = HashSet::new();
        self.users
            .iter()
            .flat_map(|u| u.stocks.iter())
            .filter(|t| seen.insert((*t).clone()))
            .cloned()
            .collect()
    }
}

fn is_yaml_file(path: &Path) -> bool {
    path.is_file()
        && matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        )
}

/// 读取目录下全部用户配置，单个文件出错只跳过该文件
pub fn load_user_configs(dir: &Path, defaults: &GlobalDefaults) -> Result<UserConfigSet> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_yaml_file(p))
        .collect();
    paths.sort();

    let mut set = UserConfigSet::default();
    let mut outputs = HashSet::new();

    for path in paths {
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("[SKIP] {} -> {}", path.display(), e);
                set.skipped.push(SkippedConfig { file: path, reason: e.to_string() });
                continue;
            }
        };

        // 误存成 HTML 的文件
        if bytes.first() == Some(&b'<') {
            let reason = "looks like HTML, not YAML".to_string();
            warn!("[SKIP] {} -> {}", path.display(), reason);
            set.skipped.push(SkippedConfig { file: path, reason });
            continue;
        }

        let content = String::from_utf8_lossy(&bytes);
        match parse_user_config(&content, &path, defaults) {
            Ok(user) => {
                if !outputs.insert(user.feed_file_name()) {
                    let reason = format!("duplicate feed {}", user.feed_file_name());
                    warn!("[SKIP] {} -> {}", path.display(), reason);
                    set.skipped.push(SkippedConfig { file: path, reason });
                    continue;
                }
                set.users.push(user);
            }
            Err(e) => {
                warn!("[SKIP] {}", e);
                set.skipped.push(SkippedConfig { file: path, reason: e.to_string() });
            }
        }
    }

    info!("Loaded {} user configs, skipped {}", set.users.len(), set.skipped.len());
    Ok(set)
}

/// 运行时配置
#[derive(Debug, Clone)]
pub struct Config {
    pub users_dir: PathBuf,
    pub output_dir: PathBuf,
    /// 只处理指定用户
    pub user_filter: Option<String>,
    pub defaults: GlobalDefaults,
}

impl Config {
    pub fn new() -> Self {
        Self::from_defaults(GlobalDefaults::default())
    }

    pub fn from_defaults(defaults: GlobalDefaults) -> Self {
        Self {
            users_dir: defaults.users_dir.clone(),
            output_dir: defaults.output_dir.clone(),
            user_filter: None,
            defaults,
        }
    }

    pub fn with_users_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.users_dir = dir.into();
        self
    }

    pub fn with_output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_user_filter(mut self, user_id: Option<String>) -> Self {
        self.user_filter = user_id;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
