use crate::config::{load_user_configs, Config, SkippedConfig, UserConfig};
use crate::errors::{FeedError, Result};
use crate::scrapers::base::MarketDataSource;
use crate::services::feed_builder::build_feed;
use crate::services::market_data::MarketDataFetcher;
use crate::util;
use chrono::DateTime;
use chrono_tz::Tz;
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 一次批处理的结果
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub generated: Vec<PathBuf>,
    /// (user_id, 原因)
    pub failed: Vec<(String, String)>,
    pub skipped_configs: Vec<SkippedConfig>,
}

impl BatchSummary {
    /// 至少生成了一个订阅文件
    pub fn is_success(&self) -> bool {
        !self.generated.is_empty()
    }

    pub fn log(&self) {
        info!(
            "[DONE] generated {} feeds, {} users failed, {} config files skipped",
            self.generated.len(),
            self.failed.len(),
            self.skipped_configs.len()
        );
        for path in &self.generated {
            info!("  [OK] {}", path.display());
        }
        for (user_id, reason) in &self.failed {
            warn!("  [ERR] {} -> {}", user_id, reason);
        }
        for skipped in &self.skipped_configs {
            warn!("  [SKIP] {} -> {}", skipped.file.display(), skipped.reason);
        }
    }
}

/// 先写临时文件再改名，托管服务不会读到写了一半的文件
pub fn write_feed(output_dir: &Path, user: &UserConfig, xml: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).map_err(|source| FeedError::WriteError {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let file_name = user.feed_file_name();
    let path = output_dir.join(&file_name);
    let tmp = output_dir.join(format!(".{}.tmp", file_name));

    fs::write(&tmp, xml).map_err(|source| FeedError::WriteError { path: tmp.clone(), source })?;
    fs::rename(&tmp, &path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        FeedError::WriteError { path: path.clone(), source }
    })?;

    Ok(path)
}

/// 批处理：加载配置 → 合并股票 → 一次性拉取 → 逐个用户生成
pub struct BatchRunner {
    config: Config,
    fetcher: MarketDataFetcher,
}

impl BatchRunner {
    pub fn new(config: Config, source: Arc<dyn MarketDataSource + Send + Sync>) -> Self {
        Self {
            config,
            fetcher: MarketDataFetcher::new(source),
        }
    }

    pub async fn run(&self) -> Result<BatchSummary> {
        self.run_at(util::beijing_now()).await
    }

    /// 以给定时间生成全部订阅；只有用户配置目录无法读取时返回错误
    pub async fn run_at(&self, now: DateTime<Tz>) -> Result<BatchSummary> {
        info!("Loading user configs from {}", self.config.users_dir.display());
        let set = load_user_configs(&self.config.users_dir, &self.config.defaults)?;

        let mut summary = BatchSummary {
            skipped_configs: set.skipped.clone(),
            ..Default::default()
        };

        let users: Vec<&UserConfig> = set
            .users
            .iter()
            .filter(|u| self.config.user_filter.as_ref().map_or(true, |id| &u.user_id == id))
            .collect();
        if users.is_empty() {
            warn!("No valid user configs to process");
            return Ok(summary);
        }

        let mut universe = Vec::new();
        for user in &users {
            universe.extend(user.stocks.iter().cloned());
        }

        let market = match self.fetcher.fetch(&universe).await {
            Ok(market) => market,
            Err(e) => {
                error!("Market data fetch failed: {}", e);
                summary.failed = users.iter().map(|u| (u.user_id.clone(), e.to_string())).collect();
                return Ok(summary);
            }
        };

        for user in users {
            let doc = build_feed(user, &market, &self.config.defaults, now);
            let result = doc
                .to_rss_string()
                .and_then(|xml| write_feed(&self.config.output_dir, user, &xml));

            match result {
                Ok(path) => {
                    info!("[OK] {} → {}", user.user_id, path.display());
                    summary.generated.push(path);
                }
                Err(e) => {
                    error!("[ERR] {} -> {}", user.user_id, e);
                    summary.failed.push((user.user_id.clone(), e.to_string()));
                }
            }
        }

        Ok(summary)
    }
}
