// src/errors.rs
use std::path::PathBuf;
use thiserror::Error;

/// fr3ki 全局统一错误类型
#[derive(Error, Debug)]
pub enum Fr3kiError {
    // === 基础 I/O ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed to '{url}': {source}")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // === 启动阶段：字典 / 代理 / 配置 ===
    /// 字典无法读取是唯一的致命错误
    #[error("Failed to load wordlist from '{path}': {source}")]
    WordlistLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load proxy list from '{path}': {source}")]
    ProxyLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read config file '{path}': {source}")]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    // === 结果输出 ===
    #[error("Failed to serialize result record: {0}")]
    RecordEncode(#[from] serde_json::Error),
}

impl Fr3kiError {
    /// 启动阶段错误中，哪些可以降级继续运行
    pub fn is_degraded_setup(&self) -> bool {
        matches!(
            self,
            Fr3kiError::ProxyLoad { .. } | Fr3kiError::ConfigLoad { .. } | Fr3kiError::ConfigParse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_wordlist_errors_are_fatal() {
        let io = || std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let wordlist = Fr3kiError::WordlistLoad { path: "w.txt".into(), source: io() };
        let proxies = Fr3kiError::ProxyLoad { path: "p.txt".into(), source: io() };
        let config = Fr3kiError::ConfigLoad { path: "c.yaml".into(), source: io() };
        assert!(!wordlist.is_degraded_setup());
        assert!(proxies.is_degraded_setup());
        assert!(config.is_degraded_setup());
        assert!(wordlist.to_string().contains("w.txt"));
    }
}
