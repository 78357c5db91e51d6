//! 并发 / 速率控制
//!
//! - 固定容量的信号量限制同时在途的请求数
//! - `rate > 0` 时每次请求在拿到 permit 之后先睡眠 `1/rate` 秒
//! - 收到 429 时按 `Retry-After`（纯数字秒数）或默认值冷却，最长 `MAX_COOLDOWN`；冷却期间仍然占着 permit
//!
//! 冷却默认只作用于观察到 429 的那一次请求（`CooldownScope::PerAttempt`），
//! 不会暂停其他在途请求。`CooldownScope::Global` 则让之后所有的新请求都等到冷却结束。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::warn;

use crate::cores::web_en::fetcher::Outcome;

/// 默认冷却时间（秒）
pub const DEFAULT_COOLDOWN_SECS: u64 = 10;
/// 单次冷却的上限，过大的 Retry-After 会被截断到这里
pub const MAX_COOLDOWN: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CooldownScope {
    /// 只延迟收到 429 的那次请求
    #[default]
    PerAttempt,
    /// 冷却期间阻塞所有新的准入
    Global,
}

/// Governor 配置
#[derive(Debug, Clone)]
pub struct GovernorConfig {
    /// 同时在途的最大请求数
    pub workers: usize,
    /// 每秒请求数，0 表示不限速
    pub rate: u32,
    /// 没有可用 Retry-After 时的冷却时间
    pub default_cooldown: Duration,
    pub scope: CooldownScope,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            rate: 0,
            default_cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS),
            scope: CooldownScope::PerAttempt,
        }
    }
}

/// 解析 Retry-After。只接受纯数字的秒数，HTTP-date 等其它形式返回 None。
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<u64>().ok().map(Duration::from_secs)
}

#[derive(Debug)]
pub struct Governor {
    config: GovernorConfig,
    permits: Arc<Semaphore>,
    pacing: Option<Duration>,
    cooldown_until: Mutex<Option<Instant>>,
}

impl Governor {
    pub fn new(mut config: GovernorConfig) -> Self {
        config.workers = config.workers.max(1);
        let pacing = (config.rate > 0).then(|| Duration::from_secs_f64(1.0 / config.rate as f64));
        Self {
            permits: Arc::new(Semaphore::new(config.workers)),
            pacing,
            cooldown_until: Mutex::new(None),
            config,
        }
    }

    pub fn capacity(&self) -> usize {
        self.config.workers
    }

    /// 当前持有 permit 的请求数
    pub fn in_flight(&self) -> usize {
        self.config.workers - self.permits.available_permits()
    }

    pub fn pacing_interval(&self) -> Option<Duration> {
        self.pacing
    }

    pub async fn cooldown_deadline(&self) -> Option<Instant> {
        *self.cooldown_until.lock().await
    }

    /// 429 时返回应冷却的时长，其它结果返回 None
    pub fn cooldown_for(&self, outcome: &Outcome) -> Option<Duration> {
        match outcome {
            Outcome::Success { status: 429, retry_after, .. } => Some(
                retry_after
                    .as_deref()
                    .and_then(parse_retry_after)
                    .unwrap_or(self.config.default_cooldown)
                    .min(MAX_COOLDOWN),
            ),
            _ => None,
        }
    }

    /// 获取准入 permit（owned，drop 即释放），随后按需等待全局冷却和限速间隔
    async fn admit(&self) -> Option<OwnedSemaphorePermit> {
        let permit = self.permits.clone().acquire_owned().await.ok()?;

        if self.config.scope == CooldownScope::Global {
            let deadline = *self.cooldown_until.lock().await;
            if let Some(t) = deadline
                && t > Instant::now()
            {
                tokio::time::sleep_until(t).await;
            }
        }

        if let Some(p) = self.pacing {
            tokio::time::sleep(p).await;
        }
        Some(permit)
    }

    async fn cool_down(&self, duration: Duration) {
        let Some(until) = Instant::now().checked_add(duration) else {
            warn!(?duration, "cooldown deadline out of range, skipping");
            return;
        };
        {
            let mut deadline = self.cooldown_until.lock().await;
            if deadline.is_none_or(|t| t < until) {
                *deadline = Some(until);
            }
        }
        tokio::time::sleep_until(until).await;
    }

    /// 在准入控制下执行一次请求。
    ///
    /// 每次调用恰好产出一个 `Outcome`。收到 429 时先调用 `on_cooldown`，再在仍持有 permit
    /// 的情况下睡眠冷却时长；请求不会被重发。
    pub async fn run<F, Fut, H>(&self, attempt: F, on_cooldown: H) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome>,
        H: FnOnce(Duration),
    {
        let Some(_permit) = self.admit().await else {
            return Outcome::Failure { error: "admission gate closed".to_string() };
        };

        let outcome = attempt().await;
        if let Some(d) = self.cooldown_for(&outcome) {
            warn!(seconds = d.as_secs(), "429 received, cooling down");
            on_cooldown(d);
            self.cool_down(d).await;
        }
        outcome
    }
}
