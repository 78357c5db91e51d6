// Tests for 429 cooldown and the admission bound

#[cfg(test)]
mod cooldown_tests {
    use crate::cores::web_en::fetcher::Outcome;
    use crate::cores::web_en::governor::{CooldownScope, Governor, GovernorConfig, MAX_COOLDOWN};
    use futures::future::join_all;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    fn throttled(retry_after: Option<&str>) -> Outcome {
        Outcome::Success {
            status: 429,
            body_length: 9,
            body_snippet: None,
            retry_after: retry_after.map(str::to_string),
        }
    }

    fn ok() -> Outcome {
        Outcome::Success { status: 200, body_length: 2, body_snippet: None, retry_after: None }
    }

    fn assert_about(elapsed: Duration, expected: Duration) {
        assert!(elapsed >= expected, "elapsed {:?} < {:?}", elapsed, expected);
        assert!(elapsed < expected + Duration::from_millis(10), "elapsed {:?} >> {:?}", elapsed, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_header_sets_cooldown() {
        let g = Governor::new(GovernorConfig { workers: 2, default_cooldown: Duration::from_secs(10), ..Default::default() });
        let seen = Mutex::new(None);
        let start = Instant::now();
        let out = g.run(|| async { throttled(Some("5")) }, |d| *seen.lock().unwrap() = Some(d)).await;
        assert_about(start.elapsed(), Duration::from_secs(5));
        assert_eq!(*seen.lock().unwrap(), Some(Duration::from_secs(5)));
        // 冷却不改变结果，也不重发
        assert_eq!(out, throttled(Some("5")));
        assert_eq!(g.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_retry_after_uses_default() {
        let g = Governor::new(GovernorConfig { workers: 2, default_cooldown: Duration::from_secs(3), ..Default::default() });
        let start = Instant::now();
        let _ = g.run(|| async { throttled(None) }, |_| {}).await;
        assert_about(start.elapsed(), Duration::from_secs(3));

        let start = Instant::now();
        let _ = g.run(|| async { throttled(Some("later")) }, |_| {}).await;
        assert_about(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_retry_after_is_capped() {
        let g = Governor::new(GovernorConfig { workers: 1, ..Default::default() });
        let seen = Mutex::new(None);
        let start = Instant::now();
        let out = g
            .run(|| async { throttled(Some("18446744073709551615")) }, |d| *seen.lock().unwrap() = Some(d))
            .await;
        assert_about(start.elapsed(), MAX_COOLDOWN);
        assert_eq!(*seen.lock().unwrap(), Some(MAX_COOLDOWN));
        assert!(out.is_throttled());
        assert_eq!(g.in_flight(), 0);

        // 之后的请求照常准入
        let next = g.run(|| async { ok() }, |_| {}).await;
        assert_eq!(next.status(), Some(200));
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_is_issued_once_even_when_throttled() {
        let g = Governor::new(GovernorConfig { workers: 1, default_cooldown: Duration::from_secs(1), ..Default::default() });
        let calls = AtomicUsize::new(0);
        let _ = g
            .run(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    throttled(None)
                },
                |_| {},
            )
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn per_attempt_cooldown_does_not_block_others() {
        let g = Governor::new(GovernorConfig { workers: 4, ..Default::default() });
        let start = Instant::now();
        let slow = async {
            let _ = g.run(|| async { throttled(Some("5")) }, |_| {}).await;
            start.elapsed()
        };
        let fast = async {
            // 在 429 之后才发起
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = g.run(|| async { ok() }, |_| {}).await;
            start.elapsed()
        };
        let (slow_done, fast_done) = tokio::join!(slow, fast);
        assert_about(slow_done, Duration::from_secs(5));
        assert_about(fast_done, Duration::from_millis(100));
        assert!(g.cooldown_deadline().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn global_cooldown_blocks_new_admissions() {
        let g = Governor::new(GovernorConfig { workers: 4, scope: CooldownScope::Global, ..Default::default() });
        let start = Instant::now();
        let slow = async {
            let _ = g.run(|| async { throttled(Some("5")) }, |_| {}).await;
            start.elapsed()
        };
        let later = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = g.run(|| async { ok() }, |_| {}).await;
            start.elapsed()
        };
        let (slow_done, later_done) = tokio::join!(slow, later);
        assert_about(slow_done, Duration::from_secs(5));
        // 新请求要等到冷却截止时间
        assert_about(later_done, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_worker_count() {
        let workers = 3;
        let g = Arc::new(Governor::new(GovernorConfig { workers, ..Default::default() }));
        let current = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let attempts = (0..20u64).map(|i| {
            let g = g.clone();
            let cur = current.clone();
            let mx = max_seen.clone();
            async move {
                let gate = g.clone();
                g.run(
                    move || async move {
                        let v = cur.fetch_add(1, Ordering::SeqCst) + 1;
                        mx.fetch_max(v, Ordering::SeqCst);
                        assert!(gate.in_flight() <= workers);
                        // 不同的完成时间
                        tokio::time::sleep(Duration::from_millis(10 + (i * 37) % 90)).await;
                        cur.fetch_sub(1, Ordering::SeqCst);
                        if i % 7 == 0 { Outcome::Failure { error: "boom".into() } } else { ok() }
                    },
                    |_| {},
                )
                .await
            }
        });
        let outcomes = join_all(attempts).await;

        assert_eq!(outcomes.len(), 20);
        assert_eq!(outcomes.iter().filter(|o| matches!(o, Outcome::Failure { .. })).count(), 3);
        let mv = max_seen.load(Ordering::SeqCst);
        assert!(mv <= workers, "max concurrent seen {} exceeds worker count", mv);
        assert_eq!(mv, workers);
        assert_eq!(g.in_flight(), 0);
    }
}
