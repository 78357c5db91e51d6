use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Proxy};
use tokio::sync::RwLock;
use tracing::debug;

use crate::cores::web_en::payload::Candidate;
use crate::cores::web_en::selector::RequestOptions;
use crate::errors::Fr3kiError;

/// 单请求总超时（连接 + TLS + 读取 body）
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// verbose 模式下截取的 body 字符数
pub const SNIPPET_CHARS: usize = 200;

/// Fetch 返回的标准化结构
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP 传输接口，测试时可替换为 mock
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, options: &RequestOptions) -> Result<FetchResponse, Fr3kiError>;
}

/// Fetcher 配置
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self { timeout: DEFAULT_TIMEOUT }
    }
}

/// 基于 reqwest 的传输实现。reqwest 的代理绑定在 Client 上，所以按代理地址缓存 Client。
#[derive(Debug, Clone)]
pub struct Fetcher {
    pub config: FetcherConfig,
    clients: Arc<RwLock<HashMap<Option<String>, Client>>>,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, Fr3kiError> {
        // 提前构造直连 client，配置错误尽早暴露
        let mut clients = HashMap::new();
        clients.insert(None, build_client(&config, None)?);
        Ok(Self { config, clients: Arc::new(RwLock::new(clients)) })
    }

    async fn client_for(&self, proxy: Option<&str>) -> Result<Client, Fr3kiError> {
        let key = proxy.map(str::to_string);
        if let Some(c) = self.clients.read().await.get(&key) {
            return Ok(c.clone());
        }
        let mut map = self.clients.write().await;
        if let Some(c) = map.get(&key) {
            return Ok(c.clone());
        }
        let client = build_client(&self.config, proxy)?;
        map.insert(key, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl HttpTransport for Fetcher {
    async fn get(&self, url: &str, options: &RequestOptions) -> Result<FetchResponse, Fr3kiError> {
        let client = self.client_for(options.proxy.as_deref()).await?;
        let resp = client
            .get(url)
            .headers(options.headers.clone())
            .send()
            .await
            .map_err(|source| Fr3kiError::HttpRequest { url: url.to_string(), source })?;

        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let headers = resp
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body = resp
            .bytes()
            .await
            .map_err(|source| Fr3kiError::HttpRequest { url: url.to_string(), source })?;

        Ok(FetchResponse { url: final_url, status, headers, body })
    }
}

fn build_client(config: &FetcherConfig, proxy: Option<&str>) -> Result<Client, Fr3kiError> {
    let mut builder = Client::builder().timeout(config.timeout);
    if let Some(addr) = proxy {
        let proxy = Proxy::all(addr).map_err(|e| Fr3kiError::ClientBuild(format!("proxy '{}': {}", addr, e)))?;
        builder = builder.proxy(proxy);
    }
    builder.build().map_err(|e| Fr3kiError::ClientBuild(e.to_string()))
}

/// 一个候选请求的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success {
        status: u16,
        body_length: u64,
        body_snippet: Option<String>,
        /// 原始 Retry-After 头，供 Governor 计算冷却时间
        retry_after: Option<String>,
    },
    Failure {
        error: String,
    },
}

impl Outcome {
    pub fn status(&self) -> Option<u16> {
        match self {
            Outcome::Success { status, .. } => Some(*status),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn is_throttled(&self) -> bool {
        self.status() == Some(429)
    }
}

/// 发出一次 GET，不做任何重试；传输层错误转为 `Outcome::Failure`
pub async fn dispatch(
    transport: &dyn HttpTransport,
    candidate: &Candidate,
    options: &RequestOptions,
    timeout: Duration,
    verbose: bool,
) -> Outcome {
    let res = match tokio::time::timeout(timeout, transport.get(&candidate.url, options)).await {
        Ok(r) => r,
        Err(_) => {
            return Outcome::Failure { error: format!("request timed out after {}s", timeout.as_secs_f64()) };
        }
    };

    match res {
        Ok(resp) => {
            let body_snippet = verbose.then(|| snippet(&resp.body));
            Outcome::Success {
                status: resp.status,
                body_length: resp.body.len() as u64,
                body_snippet,
                retry_after: resp.header("retry-after").map(str::to_string),
            }
        }
        Err(e) => {
            debug!(url = %candidate.url, error = %e, "transport failure");
            Outcome::Failure { error: e.to_string() }
        }
    }
}

fn snippet(body: &[u8]) -> String {
    String::from_utf8_lossy(body).chars().take(SNIPPET_CHARS).collect()
}
