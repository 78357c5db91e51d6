use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::cores::web_en::fetcher::Outcome;
use crate::errors::Fr3kiError;

/// 持久化的结果记录，一行一个 JSON 对象
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub url: String,
    pub status_code: u16,
    pub length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl ResultRecord {
    /// 只有成功拿到响应的结果才能转成记录
    pub fn from_outcome(url: &str, outcome: &Outcome) -> Option<Self> {
        match outcome {
            Outcome::Success { status, body_length, body_snippet, .. } => Some(Self {
                url: url.to_string(),
                status_code: *status,
                length: *body_length,
                snippet: body_snippet.clone(),
            }),
            Outcome::Failure { .. } => None,
        }
    }
}

/// 结果输出接口
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn append(&self, record: &ResultRecord) -> Result<(), Fr3kiError>;
}

/// 追加写的 JSON lines 文件。
///
/// 每条记录序列化成完整的一行后在锁内一次 `write_all`，并发追加不会交错。
/// 文件在第一次写入时才打开，打开失败只影响当次写入，下一次会重试。
#[derive(Debug)]
pub struct JsonlFileSink {
    path: PathBuf,
    file: Mutex<Option<tokio::fs::File>>,
}

impl JsonlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), file: Mutex::new(None) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResultSink for JsonlFileSink {
    async fn append(&self, record: &ResultRecord) -> Result<(), Fr3kiError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut guard = self.file.lock().await;
        if guard.is_none() {
            let f = OpenOptions::new().create(true).append(true).open(&self.path).await?;
            *guard = Some(f);
        }
        if let Some(f) = guard.as_mut() {
            f.write_all(line.as_bytes()).await?;
            f.flush().await?;
        }
        Ok(())
    }
}

/// 内存中的结果集合，便于嵌入调用和测试
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ResultRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<ResultRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn append(&self, record: &ResultRecord) -> Result<(), Fr3kiError> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}
