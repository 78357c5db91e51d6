//! YAML 配置文件层：CLI > 配置文件 > 内置默认值

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::cli::cli::Cli;
use crate::cores::web_en::governor::CooldownScope;
use crate::errors::Fr3kiError;
use crate::modules::fuzz_scan::FuzzScanConfig;

pub const DEFAULT_CONFIG_FILE: &str = "fr3ki_config.yaml";

/// 配置文件内容，所有键都可省略
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub wordlist: Option<String>,
    pub threads: Option<usize>,
    pub output: Option<String>,
    /// 代理列表文件，空字符串等同于不配置
    pub proxies: Option<String>,
    pub headers: Vec<String>,
}

fn is_blank_document(text: &str) -> bool {
    text.lines().map(str::trim).all(|l| l.is_empty() || l.starts_with('#'))
}

pub fn load_config(path: &Path) -> Result<FileConfig, Fr3kiError> {
    let text =
        std::fs::read_to_string(path).map_err(|source| Fr3kiError::ConfigLoad { path: path.to_path_buf(), source })?;
    if is_blank_document(&text) {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&text).map_err(|source| Fr3kiError::ConfigParse { path: path.to_path_buf(), source })
}

/// 配置文件缺失或格式错误时记录警告并使用默认值
pub fn load_config_or_default(path: &Path) -> FileConfig {
    match load_config(path) {
        Ok(cfg) => {
            debug!(path = %path.display(), "config file loaded");
            cfg
        }
        Err(e) => {
            warn!(error = %e, "config file not usable, using defaults");
            FileConfig::default()
        }
    }
}

/// 合并 CLI 参数与配置文件。`-A` 头追加在配置文件的头之后。
pub fn build_config(cli: &Cli, file: FileConfig) -> FuzzScanConfig {
    let defaults = FuzzScanConfig::default();

    let proxies = cli
        .proxies
        .clone()
        .or_else(|| file.proxies.filter(|p| !p.trim().is_empty()).map(PathBuf::from));

    let mut headers = file.headers;
    headers.extend(cli.headers.iter().cloned());

    FuzzScanConfig {
        url: cli.url.clone(),
        wordlist: cli.wordlist.clone().or(file.wordlist.map(PathBuf::from)).unwrap_or(defaults.wordlist),
        workers: cli.threads.map(|t| t as usize).or(file.threads).unwrap_or(defaults.workers).max(1),
        output: cli.output.clone().or(file.output.map(PathBuf::from)).unwrap_or(defaults.output),
        rate: cli.rate,
        cooldown: Duration::from_secs(cli.cooldown),
        cooldown_scope: if cli.global_cooldown { CooldownScope::Global } else { CooldownScope::PerAttempt },
        debug: cli.debug,
        obfuscate: cli.obfuscate,
        verbose: cli.verbose,
        proxies,
        headers,
        ..defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use crate::modules::fuzz_scan::{DEFAULT_OUTPUT, DEFAULT_WORDLIST, DEFAULT_WORKERS};

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["fr3ki", "-u", "http://t/FUZZ"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn defaults_apply_without_config() {
        let cfg = build_config(&cli(&[]), FileConfig::default());
        assert_eq!(cfg.url, "http://t/FUZZ");
        assert_eq!(cfg.wordlist, PathBuf::from(DEFAULT_WORDLIST));
        assert_eq!(cfg.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(cfg.workers, DEFAULT_WORKERS);
        assert_eq!(cfg.rate, 0);
        assert_eq!(cfg.cooldown, Duration::from_secs(10));
        assert_eq!(cfg.cooldown_scope, CooldownScope::PerAttempt);
        assert!(cfg.proxies.is_none());
        assert!(cfg.headers.is_empty());
    }

    #[test]
    fn cli_overrides_config_file() {
        let file = FileConfig {
            wordlist: Some("from_file.txt".into()),
            threads: Some(4),
            output: Some("file_out.json".into()),
            proxies: Some("file_proxies.txt".into()),
            headers: vec!["X-From: file".into()],
        };
        let cfg = build_config(
            &cli(&["-w", "cli.txt", "-t", "7", "-A", "X-From: cli", "--global-cooldown"]),
            file.clone(),
        );
        assert_eq!(cfg.wordlist, PathBuf::from("cli.txt"));
        assert_eq!(cfg.workers, 7);
        assert_eq!(cfg.output, PathBuf::from("file_out.json"));
        assert_eq!(cfg.proxies, Some(PathBuf::from("file_proxies.txt")));
        assert_eq!(cfg.headers, vec!["X-From: file", "X-From: cli"]);
        assert_eq!(cfg.cooldown_scope, CooldownScope::Global);

        let cfg = build_config(&cli(&[]), file);
        assert_eq!(cfg.wordlist, PathBuf::from("from_file.txt"));
        assert_eq!(cfg.workers, 4);
    }

    #[test]
    fn empty_proxy_entry_means_no_proxies() {
        let file = FileConfig { proxies: Some("".into()), threads: Some(0), ..Default::default() };
        let cfg = build_config(&cli(&[]), file);
        assert!(cfg.proxies.is_none());
        assert_eq!(cfg.workers, 1);
    }

    #[test]
    fn yaml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &path,
            "wordlist: lists/big.txt\nthreads: 25\nheaders:\n  - \"Authorization: Bearer t\"\n  - \"X-Test: 1\"\n",
        )
        .unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.wordlist.as_deref(), Some("lists/big.txt"));
        assert_eq!(cfg.threads, Some(25));
        assert_eq!(cfg.output, None);
        assert_eq!(cfg.headers.len(), 2);
    }

    #[test]
    fn missing_empty_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert!(matches!(load_config(&missing), Err(Fr3kiError::ConfigLoad { .. })));
        assert_eq!(load_config_or_default(&missing), FileConfig::default());

        let empty = dir.path().join("empty.yaml");
        std::fs::write(&empty, "\n# nothing yet\n").unwrap();
        assert_eq!(load_config(&empty).unwrap(), FileConfig::default());

        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "threads: [not, a, number\n").unwrap();
        let err = load_config(&broken).unwrap_err();
        assert!(matches!(err, Fr3kiError::ConfigParse { .. }));
        assert!(err.is_degraded_setup());
        assert_eq!(load_config_or_default(&broken), FileConfig::default());
    }
}
