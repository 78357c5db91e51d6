pub mod classify;
pub mod console;
pub mod loader;
pub mod orchestrator;
pub mod sink;


pub use classify::{Classification, ColorTag, classify};
pub use console::Console;
pub use orchestrator::{FuzzOrchestrator, Phase, RunSummary, run_fuzz_scan};
pub use sink::{JsonlFileSink, MemorySink, ResultRecord, ResultSink};

use std::path::PathBuf;
use std::time::Duration;

use crate::cores::web_en::fetcher::DEFAULT_TIMEOUT;
use crate::cores::web_en::governor::{CooldownScope, DEFAULT_COOLDOWN_SECS, GovernorConfig};

pub const DEFAULT_WORDLIST: &str = "wordlists/common.txt";
pub const DEFAULT_OUTPUT: &str = "fr3ki_results.json";
pub const DEFAULT_WORKERS: usize = 10;

/// 一次 fuzz 运行的全部参数，加载完成后冻结在 `Arc` 里
#[derive(Debug, Clone)]
pub struct FuzzScanConfig {
    /// 含 `FUZZ` 占位符的 URL 模板
    pub url: String,
    pub wordlist: PathBuf,
    /// 并发上限，同时也是批大小
    pub workers: usize,
    /// 结果输出（JSON lines，追加写）
    pub output: PathBuf,
    /// 每秒请求数，0 表示不限速
    pub rate: u32,
    /// 429 且没有 Retry-After 时的冷却时间
    pub cooldown: Duration,
    pub cooldown_scope: CooldownScope,
    /// 记录所有响应，而不只是"有趣"的
    pub debug: bool,
    pub obfuscate: bool,
    /// 记录 body 前 200 个字符
    pub verbose: bool,
    pub proxies: Option<PathBuf>,
    /// `Name: Value` 形式的自定义头
    pub headers: Vec<String>,
    pub timeout: Duration,
    /// 批与批之间的随机等待区间
    pub jitter_min: Duration,
    pub jitter_max: Duration,
}

impl Default for FuzzScanConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            wordlist: PathBuf::from(DEFAULT_WORDLIST),
            workers: DEFAULT_WORKERS,
            output: PathBuf::from(DEFAULT_OUTPUT),
            rate: 0,
            cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS),
            cooldown_scope: CooldownScope::PerAttempt,
            debug: false,
            obfuscate: false,
            verbose: false,
            proxies: None,
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            jitter_min: Duration::from_millis(500),
            jitter_max: Duration::from_millis(2000),
        }
    }
}

impl FuzzScanConfig {
    pub fn governor_config(&self) -> GovernorConfig {
        GovernorConfig {
            workers: self.workers.max(1),
            rate: self.rate,
            default_cooldown: self.cooldown,
            scope: self.cooldown_scope,
        }
    }
}
