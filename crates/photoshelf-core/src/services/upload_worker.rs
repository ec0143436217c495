//! 单个文件的上传状态机
//!
//! 状态迁移 `uploading → {processing → done, error, skipped}` 由一组命名事件驱动，
//! 迁移函数是纯函数，不依赖任何传输实现。

use std::sync::Arc;

use crate::models::{Photo, UploadFile, UploadId, UploadRecord, UploadStatus};
use crate::services::api::{TransportError, UploadTransport};
use crate::services::upload_panel::UploadPanel;

/// 网络失败时显示的文字
pub const NETWORK_ERROR_MESSAGE: &str = "Network error";
/// 批次取消时未开始文件显示的文字
pub const CANCELLED_MESSAGE: &str = "Upload cancelled";

/// 失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// 非 2xx 且非 409
    Http(u16),
    /// 没有收到响应
    Network,
    /// 批次取消，文件未开始上传
    Cancelled,
    /// 上传任务 panic
    Crashed,
}

impl FailureReason {
    pub fn message(&self) -> String {
        match self {
            FailureReason::Http(status) => format!("HTTP {}", status),
            FailureReason::Network => NETWORK_ERROR_MESSAGE.to_string(),
            FailureReason::Cancelled => CANCELLED_MESSAGE.to_string(),
            FailureReason::Crashed => "Upload worker crashed".to_string(),
        }
    }
}

/// 驱动状态机的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// 已发送字节数
    Progress { loaded: u64, total: u64 },
    /// 全部字节已发出，等待服务端响应
    Sent,
    /// 2xx
    Succeeded,
    /// 409，服务端判定重名
    Duplicate,
    Failed(FailureReason),
}

/// 状态迁移。终止状态忽略一切事件；进度只增不减且不超过 100
pub fn transition(record: &UploadRecord, event: &UploadEvent) -> UploadRecord {
    if record.is_terminal() {
        return record.clone();
    }

    let mut next = record.clone();
    match event {
        UploadEvent::Progress { loaded, total } => {
            if record.status == UploadStatus::Uploading && *total > 0 {
                let pct = (loaded.saturating_mul(100) / total).min(100) as u8;
                next.progress = next.progress.max(pct);
            }
        }
        UploadEvent::Sent => {
            next.status = UploadStatus::Processing;
            next.progress = 100;
        }
        UploadEvent::Succeeded => {
            next.status = UploadStatus::Done;
            next.progress = 100;
            next.error = None;
        }
        UploadEvent::Duplicate => return next.into_skipped(),
        UploadEvent::Failed(reason) => {
            next.status = UploadStatus::Error;
            next.error = Some(reason.message());
        }
    }
    next
}

/// 传输结果到终止事件的唯一映射
pub fn outcome_event(result: &Result<Photo, TransportError>) -> UploadEvent {
    match result {
        Ok(_) => UploadEvent::Succeeded,
        Err(TransportError::Status(409)) => UploadEvent::Duplicate,
        Err(TransportError::Status(status)) => UploadEvent::Failed(FailureReason::Http(*status)),
        Err(TransportError::Network(_)) => UploadEvent::Failed(FailureReason::Network),
    }
}

/// 终止事件对应的状态
fn terminal_status(event: &UploadEvent) -> UploadStatus {
    match event {
        UploadEvent::Succeeded => UploadStatus::Done,
        UploadEvent::Duplicate => UploadStatus::Skipped,
        UploadEvent::Failed(_) => UploadStatus::Error,
        UploadEvent::Progress { .. } => UploadStatus::Uploading,
        UploadEvent::Sent => UploadStatus::Processing,
    }
}

/// 传输层用来汇报字节进度的句柄
#[derive(Clone)]
pub struct ProgressReporter {
    id: UploadId,
    panel: Arc<UploadPanel>,
}

impl ProgressReporter {
    pub fn new(id: UploadId, panel: Arc<UploadPanel>) -> Self {
        Self { id, panel }
    }

    pub fn id(&self) -> UploadId {
        self.id
    }

    /// 已发送 `loaded` / `total` 字节
    pub fn progress(&self, loaded: u64, total: u64) {
        self.panel.apply(self.id, &UploadEvent::Progress { loaded, total });
    }

    /// 全部字节已发出
    pub fn sent(&self) {
        self.panel.apply(self.id, &UploadEvent::Sent);
    }
}

/// 单个文件的最终结果
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    pub id: UploadId,
    pub name: String,
    pub status: UploadStatus,
    /// 仅在 done 时存在
    pub photo: Option<Photo>,
}

/// 上传一个文件直到终止状态。每次调用只产生一个结果
pub async fn run_worker<T: UploadTransport>(
    transport: Arc<T>,
    panel: Arc<UploadPanel>,
    id: UploadId,
    file: UploadFile,
) -> WorkerOutcome {
    let name = file.name.clone();
    tracing::debug!(upload = %id, name = %name, size = file.size, "开始上传");

    let reporter = ProgressReporter::new(id, panel.clone());
    let result = transport.upload(file, reporter).await;

    match &result {
        Ok(photo) => tracing::info!(name = %name, photo_id = photo.id, "上传完成"),
        Err(TransportError::Status(409)) => tracing::info!(name = %name, "服务端判定重名，跳过"),
        Err(e) => tracing::warn!(name = %name, "上传失败: {}", e),
    }

    let event = outcome_event(&result);
    let status = panel
        .apply(id, &event)
        .map(|record| record.status)
        .unwrap_or_else(|| terminal_status(&event));

    WorkerOutcome {
        id,
        name,
        status,
        photo: result.ok().filter(|_| status == UploadStatus::Done),
    }
}
