use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cores::web_en::fetcher::Outcome;
use crate::modules::fuzz_scan::classify::{ColorTag, color_for};

pub const BANNER: &str = r#"
    ______    _____ __   _
   / ____/___|__  // /__(_)
  / /_  / ___//_ </ //_/ /
 / __/ / /  ___/ / ,< / /
/_/   /_/  /____/_/|_/_/

          fr3ki
"#;

pub fn print_banner() {
    println!("{}", BANNER.red().bold());
}

/// 一个结果对应的控制台输出行
pub fn render_line(url: &str, outcome: &Outcome) -> String {
    let text = match outcome {
        Outcome::Success { status: 403, .. } => format!("{} [403 Forbidden]", url),
        Outcome::Success { status: 404, .. } => format!("{} [404 Not Found]", url),
        Outcome::Success { status, .. } => format!("{} [{}]", url, status),
        Outcome::Failure { error } => format!("Error with {}: {}", url, error),
    };
    match color_for(outcome) {
        ColorTag::Positive => text.green().to_string(),
        ColorTag::Caution => text.yellow().to_string(),
        ColorTag::Neutral => text.cyan().to_string(),
        ColorTag::Negative => text.red().to_string(),
    }
}

/// 终端输出：彩色结果行 + 按词计数的进度条
#[derive(Clone)]
pub struct Console {
    bar: ProgressBar,
}

impl Console {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar.set_message("Fuzzing with fr3ki...".cyan().to_string());
        Self { bar }
    }

    /// 不输出任何内容
    pub fn hidden() -> Self {
        Self { bar: ProgressBar::hidden() }
    }

    pub fn set_total_words(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    pub fn advance_words(&self, n: usize) {
        self.bar.inc(n as u64);
    }

    pub fn words_done(&self) -> u64 {
        self.bar.position()
    }

    // 经由进度条打印，避免撕裂进度条
    pub fn report(&self, url: &str, outcome: &Outcome) {
        self.bar.println(render_line(url, outcome));
    }

    pub fn throttled(&self, cooldown: Duration) {
        let msg = format!("429 received, cooling down for {} seconds.", cooldown.as_secs());
        self.bar.println(msg.yellow().to_string());
    }

    pub fn warn(&self, msg: &str) {
        self.bar.println(msg.yellow().to_string());
    }

    pub fn finish(&self) {
        self.bar.finish();
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
