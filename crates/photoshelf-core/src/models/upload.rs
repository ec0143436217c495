//! 上传数据模型
//!
//! UploadRecord 只存在于客户端，批次结束后从面板移除

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 上传记录 ID，每次上传尝试都重新生成
pub type UploadId = Uuid;

/// 上传状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploading,
    Processing,
    Done,
    Error,
    Skipped,
}

impl UploadStatus {
    /// 终止状态不会再迁移
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Done | UploadStatus::Error | UploadStatus::Skipped)
    }

    pub fn name(&self) -> &'static str {
        match self {
            UploadStatus::Uploading => "uploading",
            UploadStatus::Processing => "processing",
            UploadStatus::Done => "done",
            UploadStatus::Error => "error",
            UploadStatus::Skipped => "skipped",
        }
    }
}

/// 上传面板中的一条记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub id: UploadId,
    pub name: String,
    /// 0-100
    pub progress: u8,
    pub status: UploadStatus,
    pub error: Option<String>,
}

impl UploadRecord {
    /// 新建一条处于 uploading 状态的记录
    pub fn uploading(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            progress: 0,
            status: UploadStatus::Uploading,
            error: None,
        }
    }

    /// 客户端查重命中时的记录
    pub fn skipped(name: impl Into<String>) -> Self {
        Self::uploading(name).into_skipped()
    }

    /// 重复文件的终止形态。客户端查重和服务端 409 都走这里，
    /// 保证两条路径得到同样的记录
    pub fn into_skipped(self) -> Self {
        Self {
            progress: 100,
            status: UploadStatus::Skipped,
            error: None,
            ..self
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// 面板上显示的状态文字
    pub fn status_text(&self) -> String {
        match self.status {
            UploadStatus::Uploading => format!("{}%", self.progress),
            UploadStatus::Processing => "processing…".to_string(),
            UploadStatus::Done => "done".to_string(),
            UploadStatus::Skipped => "skipped".to_string(),
            UploadStatus::Error => self
                .error
                .clone()
                .unwrap_or_else(|| "error".to_string()),
        }
    }
}

/// 待上传文件的数据来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    Path(PathBuf),
    Memory(Vec<u8>),
}

/// 待上传文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// 文件名，用于查重和 multipart 的 filename
    pub name: String,
    /// 字节数
    pub size: u64,
    /// 可选标题，随表单一起提交
    pub title: Option<String>,
    pub source: UploadSource,
}

impl UploadFile {
    /// 从磁盘文件创建，文件名取路径最后一段
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let size = std::fs::metadata(&path)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("路径没有文件名: {}", path.display()),
                )
            })?;
        Ok(Self {
            name,
            size,
            title: None,
            source: UploadSource::Path(path),
        })
    }

    /// 从内存数据创建
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            title: None,
            source: UploadSource::Memory(bytes),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ids_are_unique_per_attempt() {
        let a = UploadRecord::uploading("a.jpg");
        let b = UploadRecord::uploading("a.jpg");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_skipped_shape() {
        let rec = UploadRecord::skipped("a.jpg");
        assert_eq!(rec.status, UploadStatus::Skipped);
        assert_eq!(rec.error, None);
        assert!(rec.is_terminal());
        assert_eq!(rec.status_text(), "skipped");
    }

    #[test]
    fn test_status_text() {
        let mut rec = UploadRecord::uploading("a.jpg");
        rec.progress = 42;
        assert_eq!(rec.status_text(), "42%");
        rec.status = UploadStatus::Processing;
        assert_eq!(rec.status_text(), "processing…");
        rec.status = UploadStatus::Error;
        rec.error = Some("HTTP 500".into());
        assert_eq!(rec.status_text(), "HTTP 500");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let rec = UploadRecord::uploading("a.jpg");
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["status"], "uploading");
        assert_eq!(json["progress"], 0);
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_upload_file_from_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("c.jpg");
        std::fs::write(&path, b"12345").unwrap();

        let file = UploadFile::from_path(&path).unwrap().with_title("C");
        assert_eq!(file.name, "c.jpg");
        assert_eq!(file.size, 5);
        assert_eq!(file.title.as_deref(), Some("C"));
    }
}
