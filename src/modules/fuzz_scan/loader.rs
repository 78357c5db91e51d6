use std::path::Path;

use tracing::warn;
use url::Url;

use crate::errors::Fr3kiError;

/// 按行切分，去掉首尾空白并丢弃空行，保持原顺序
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// 读取字典。失败是致命错误。
pub fn load_wordlist(path: &Path) -> Result<Vec<String>, Fr3kiError> {
    let raw = std::fs::read(path).map_err(|source| Fr3kiError::WordlistLoad { path: path.to_path_buf(), source })?;
    Ok(parse_lines(&String::from_utf8_lossy(&raw)))
}

/// 读取代理列表（每行 `scheme://host:port`），无法解析的行会被跳过
pub fn load_proxies(path: &Path) -> Result<Vec<String>, Fr3kiError> {
    let text =
        std::fs::read_to_string(path).map_err(|source| Fr3kiError::ProxyLoad { path: path.to_path_buf(), source })?;
    Ok(parse_lines(&text)
        .into_iter()
        .filter(|line| match Url::parse(line) {
            Ok(u) if u.host_str().is_some() => true,
            _ => {
                warn!(proxy = %line, "skipping malformed proxy entry");
                false
            }
        })
        .collect())
}
