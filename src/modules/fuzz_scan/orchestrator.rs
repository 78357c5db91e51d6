//! fuzz 主循环：`Loading → Batching → Draining → Done`
//!
//! 字典按 worker 数切批；每批内所有候选并发执行，全部结束后才进入下一批（批屏障），
//! 每批结束后（包括最后一批）插入随机等待。

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use crate::cores::web_en::fetcher::{Fetcher, FetcherConfig, HttpTransport, Outcome, dispatch};
use crate::cores::web_en::governor::Governor;
use crate::cores::web_en::payload::{Candidate, PLACEHOLDER};
use crate::cores::web_en::selector::{RandomSource, Selector, ThreadRandom};
use crate::errors::Fr3kiError;
use crate::modules::fuzz_scan::FuzzScanConfig;
use crate::modules::fuzz_scan::classify::classify;
use crate::modules::fuzz_scan::console::Console;
use crate::modules::fuzz_scan::loader::{load_proxies, load_wordlist};
use crate::modules::fuzz_scan::sink::{JsonlFileSink, ResultRecord, ResultSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Batching,
    Draining,
    Done,
}

/// 一次运行的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 每一批的词数
    pub batch_sizes: Vec<usize>,
    pub words: usize,
    pub candidates: usize,
    pub persisted: usize,
    pub failures: usize,
    pub throttled: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct CandidateReport {
    persisted: bool,
    failed: bool,
    throttled: bool,
}

pub struct FuzzOrchestrator {
    config: Arc<FuzzScanConfig>,
    transport: Arc<dyn HttpTransport>,
    random: Arc<dyn RandomSource>,
    sink: Arc<dyn ResultSink>,
    console: Console,
    governor: Governor,
    phase: Phase,
}

impl FuzzOrchestrator {
    pub fn new(
        config: FuzzScanConfig,
        transport: Arc<dyn HttpTransport>,
        random: Arc<dyn RandomSource>,
        sink: Arc<dyn ResultSink>,
        console: Console,
    ) -> Self {
        let governor = Governor::new(config.governor_config());
        Self { config: Arc::new(config), transport, random, sink, console, governor, phase: Phase::Loading }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &FuzzScanConfig {
        &self.config
    }

    /// 从配置中的文件加载字典和代理后运行。只有字典读取失败会返回错误。
    pub async fn run(&mut self) -> Result<RunSummary, Fr3kiError> {
        self.phase = Phase::Loading;
        let words = load_wordlist(&self.config.wordlist)?;

        let proxies = match &self.config.proxies {
            Some(path) => load_proxies(path).unwrap_or_else(|e| {
                warn!(error = %e, "proxy file not usable, proceeding without proxies");
                self.console.warn("Proxy file not found. Proceeding without proxies.");
                Vec::new()
            }),
            None => Vec::new(),
        };

        Ok(self.run_words(words, proxies).await)
    }

    /// 对已加载的字典执行 fuzz
    pub async fn run_words(&mut self, words: Vec<String>, proxies: Vec<String>) -> RunSummary {
        let cfg = self.config.clone();
        if !cfg.url.contains(PLACEHOLDER) {
            warn!(url = %cfg.url, "target URL has no {} placeholder", PLACEHOLDER);
        }
        info!(
            url = %cfg.url,
            words = words.len(),
            workers = self.governor.capacity(),
            proxies = proxies.len(),
            obfuscate = cfg.obfuscate,
            "starting fuzz run"
        );

        let selector = Selector::new(proxies, &cfg.headers, self.random.clone());
        self.console.set_total_words(words.len());

        let mut summary = RunSummary { words: words.len(), ..Default::default() };
        let batches: Vec<&[String]> = words.chunks(self.governor.capacity()).collect();
        let batch_count = batches.len();

        for (idx, batch) in batches.into_iter().enumerate() {
            self.phase = Phase::Batching;
            let candidates: Vec<Candidate> =
                batch.iter().flat_map(|w| Candidate::expand(&cfg.url, w, cfg.obfuscate)).collect();
            summary.batch_sizes.push(batch.len());
            summary.candidates += candidates.len();

            self.phase = Phase::Draining;
            let fan_out = candidates.len().max(1);
            let reports: Vec<CandidateReport> = stream::iter(candidates)
                .map(|c| self.process(&selector, c))
                .buffer_unordered(fan_out)
                .collect()
                .await;

            for r in &reports {
                summary.persisted += r.persisted as usize;
                summary.failures += r.failed as usize;
                summary.throttled += r.throttled as usize;
            }
            self.console.advance_words(batch.len());
            debug!(batch = idx + 1, of = batch_count, words = batch.len(), requests = reports.len(), "batch drained");

            tokio::time::sleep(self.jitter()).await;
        }

        self.phase = Phase::Done;
        self.console.finish();
        info!(
            words = summary.words,
            requests = summary.candidates,
            persisted = summary.persisted,
            failures = summary.failures,
            throttled = summary.throttled,
            "fuzz run finished"
        );
        summary
    }

    fn jitter(&self) -> Duration {
        let low = self.config.jitter_min.as_secs_f64();
        let high = self.config.jitter_max.as_secs_f64();
        Duration::from_secs_f64(self.random.uniform(low, high).max(0.0))
    }

    /// 单个候选：选择器 → Governor(请求) → 分类 / 落盘 → 控制台
    async fn process(&self, selector: &Selector, candidate: Candidate) -> CandidateReport {
        let options = selector.select();
        let transport = self.transport.as_ref();
        let cfg = &self.config;

        let outcome = self
            .governor
            .run(
                || dispatch(transport, &candidate, &options, cfg.timeout, cfg.verbose),
                |cooldown| self.console.throttled(cooldown),
            )
            .await;

        let class = classify(&candidate.url, &outcome, cfg.debug);
        let mut report = CandidateReport {
            failed: matches!(outcome, Outcome::Failure { .. }),
            throttled: outcome.is_throttled(),
            ..Default::default()
        };
        if class.persist
            && let Some(record) = ResultRecord::from_outcome(&candidate.url, &outcome)
        {
            match self.sink.append(&record).await {
                Ok(()) => report.persisted = true,
                Err(e) => error!(url = %candidate.url, error = %e, "failed to persist result"),
            }
        }
        self.console.report(&candidate.url, &outcome);
        report
    }
}

/// 使用默认组件（reqwest、线程随机源、JSONL 文件、终端）执行一次完整运行
pub async fn run_fuzz_scan(config: FuzzScanConfig) -> Result<RunSummary, Fr3kiError> {
    let fetcher = Fetcher::new(FetcherConfig { timeout: config.timeout })?;
    let sink = JsonlFileSink::new(&config.output);
    let mut orchestrator =
        FuzzOrchestrator::new(config, Arc::new(fetcher), Arc::new(ThreadRandom), Arc::new(sink), Console::new());
    orchestrator.run().await
}
