//! 载荷生成：把字典中的一个词展开为若干编码变体
//!
//! 变体集合是无序的（`HashSet`），调用方不得依赖顺序。

use std::collections::HashSet;
use std::fmt::Write as _;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// URL 模板中的占位符
pub const PLACEHOLDER: &str = "FUZZ";

/// 一个完整的待请求候选：原始词 + 编码后的载荷 + 替换后的 URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub original_word: String,
    pub encoded_payload: String,
    pub url: String,
}

impl Candidate {
    pub fn new(template: &str, word: &str, payload: String) -> Self {
        Self {
            original_word: word.to_string(),
            url: template.replace(PLACEHOLDER, &payload),
            encoded_payload: payload,
        }
    }

    /// 把一个词展开为所有候选（每个载荷变体一个）
    pub fn expand(template: &str, word: &str, obfuscate: bool) -> Vec<Candidate> {
        generate(word, obfuscate)
            .into_iter()
            .map(|payload| Candidate::new(template, word, payload))
            .collect()
    }
}

/// 生成载荷集合。`obfuscate == false` 时只返回原词。
pub fn generate(word: &str, obfuscate: bool) -> HashSet<String> {
    let mut out = HashSet::new();
    out.insert(word.to_string());
    if !obfuscate {
        return out;
    }

    let quoted = percent_encode(word);
    out.insert(percent_encode(&quoted));
    out.insert(quoted);
    out.insert(base64_encode(word));
    out.insert(hex_percent_encode(word));
    out.insert(slash_colon_encode(word));
    out.insert(unicode_escape(word));
    out
}

/// 不编码的字符：RFC 3986 unreserved 加上 `/`
const PATH_KEEP: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~').remove(b'/');

/// Percent encoding with uppercase hex. Unreserved characters and `/` stay literal.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, PATH_KEEP).to_string()
}

pub fn base64_encode(input: &str) -> String {
    STANDARD.encode(input.as_bytes())
}

/// 每个字符都编码为 `%xx`（按码点，ASCII 也不例外）
pub fn hex_percent_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len() * 3);
    for ch in input.chars() {
        let _ = write!(encoded, "%{:02x}", ch as u32);
    }
    encoded
}

pub fn slash_colon_encode(input: &str) -> String {
    input.replace('/', "%2F").replace(':', "%3A")
}

/// `\uXXXX` escape, one per UTF-16 code unit. The backslash goes out as `%5C`:
/// URL parsers rewrite a bare `\` in http paths to `/`.
pub fn unicode_escape(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len() * 8);
    for unit in input.encode_utf16() {
        let _ = write!(encoded, "%5Cu{:04x}", unit);
    }
    encoded
}
