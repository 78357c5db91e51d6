use std::fmt;
use std::sync::Arc;

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use tracing::debug;

/// 随机源接口，测试时可替换为确定性实现
pub trait RandomSource: Send + Sync + fmt::Debug {
    /// 返回 `[0, len)` 内的下标，调用方保证 `len > 0`
    fn pick(&self, len: usize) -> usize;
    /// 返回 `[low, high]` 内的均匀随机数
    fn uniform(&self, low: f64, high: f64) -> f64;
}

/// 基于线程本地 RNG 的默认随机源
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }

    fn uniform(&self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        rand::thread_rng().gen_range(low..=high)
    }
}

pub const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148",
    "Mozilla/5.0 (Linux; Android 11; Pixel 4) AppleWebKit/537.36 Chrome/91.0.4472.124 Mobile Safari/537.36",
];

/// 单个候选请求的传输参数，每个候选重新构造
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    pub proxy: Option<String>,
}

/// 解析 `Name: Value` 形式的自定义头。没有冒号或名称/值非法时返回 None。
pub fn parse_custom_header(raw: &str) -> Option<(HeaderName, HeaderValue)> {
    let (name, value) = raw.split_once(':')?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).ok()?;
    let value = HeaderValue::from_str(value.trim()).ok()?;
    Some((name, value))
}

/// 代理 / 请求头选择器
#[derive(Debug, Clone)]
pub struct Selector {
    proxies: Arc<Vec<String>>,
    custom_headers: Vec<(HeaderName, HeaderValue)>,
    random: Arc<dyn RandomSource>,
}

impl Selector {
    pub fn new(proxies: Vec<String>, custom_headers: &[String], random: Arc<dyn RandomSource>) -> Self {
        let custom_headers = custom_headers
            .iter()
            .filter_map(|raw| {
                let parsed = parse_custom_header(raw);
                if parsed.is_none() {
                    debug!(header = %raw, "skipping malformed custom header");
                }
                parsed
            })
            .collect();
        Self { proxies: Arc::new(proxies), custom_headers, random }
    }

    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    /// 为一个候选构造传输参数
    pub fn select(&self) -> RequestOptions {
        RequestOptions { headers: self.build_headers(), proxy: self.pick_proxy() }
    }

    pub fn pick_proxy(&self) -> Option<String> {
        if self.proxies.is_empty() {
            return None;
        }
        let idx = self.random.pick(self.proxies.len());
        self.proxies.get(idx).cloned()
    }

    pub fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let ua = USER_AGENTS[self.random.pick(USER_AGENTS.len()) % USER_AGENTS.len()];
        headers.insert(USER_AGENT, HeaderValue::from_static(ua));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        // 自定义头覆盖默认值（HeaderName 大小写不敏感）
        for (name, value) in &self.custom_headers {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }
}
