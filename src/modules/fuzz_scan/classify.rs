use crate::cores::web_en::fetcher::Outcome;

/// 视为成功的状态码
pub const SUCCESS_CODES: [u16; 4] = [200, 201, 202, 204];
/// body 超过该长度即视为值得记录
pub const LARGE_BODY_BYTES: u64 = 1000;
/// URL 中出现即记录
pub const INTERESTING_MARKERS: [&str; 2] = ["admin", "secure"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTag {
    Positive,
    Caution,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub display: ColorTag,
    pub persist: bool,
}

pub fn color_for(outcome: &Outcome) -> ColorTag {
    match outcome.status() {
        Some(s) if SUCCESS_CODES.contains(&s) => ColorTag::Positive,
        Some(403) => ColorTag::Caution,
        Some(404) => ColorTag::Neutral,
        _ => ColorTag::Negative,
    }
}

/// 粗粒度的"有趣响应"判定，规则需保持原样
pub fn should_persist(url: &str, status: u16, length: u64, debug: bool) -> bool {
    debug
        || SUCCESS_CODES.contains(&status)
        || length > LARGE_BODY_BYTES
        || INTERESTING_MARKERS.iter().any(|m| url.contains(m))
}

/// 传输失败永不落盘
pub fn classify(url: &str, outcome: &Outcome, debug: bool) -> Classification {
    let persist = match outcome {
        Outcome::Success { status, body_length, .. } => should_persist(url, *status, *body_length, debug),
        Outcome::Failure { .. } => false,
    };
    Classification { display: color_for(outcome), persist }
}
