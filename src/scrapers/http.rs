use crate::config::NetworkSettings;
use crate::errors::{FeedError, Result};
use log::{debug, warn};
use reqwest::{Client, Proxy, RequestBuilder};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// 带重试与限速的 HTTP 客户端，供各数据源共用
pub struct HttpFetcher {
    client: Client,
    retries: u32,
    request_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl HttpFetcher {
    pub fn new(settings: &NetworkSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs));

        if let Some(proxy) = settings.proxy.as_deref().filter(|p| !p.is_empty()) {
            debug!("Using proxy {}", proxy);
            builder = builder.proxy(Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
            retries: settings.retries,
            request_interval: Duration::from_millis(settings.request_interval_ms),
            last_request: Mutex::new(None),
        })
    }

    // 添加请求限速机制
    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(time) = *last {
            let elapsed = time.elapsed();
            if elapsed < self.request_interval {
                let wait = self.request_interval - elapsed;
                debug!("等待 {:?} 以遵守频率限制", wait);
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// 发送请求并返回响应体字节；失败时按配置重试
    pub async fn get_bytes<F>(&self, build: F) -> Result<Vec<u8>>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            self.wait_for_rate_limit().await;

            let result: Result<Vec<u8>> = async {
                let response = build(&self.client).send().await?;
                if !response.status().is_success() {
                    return Err(FeedError::DataError(format!("HTTP status {}", response.status())));
                }
                Ok(response.bytes().await?.to_vec())
            }
            .await;

            match result {
                Ok(bytes) => return Ok(bytes),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!("Request failed ({}), retry {}/{}", e, attempt, self.retries);
                    tokio::time::sleep(Duration::from_millis(800 * attempt as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
