//! 照片接口抽象
//!
//! 核心库只通过这两个 trait 访问网络，HTTP 实现在应用层

use std::future::Future;

use thiserror::Error;

use crate::models::{Photo, PhotoId, PhotoUpdate, UploadFile};
use crate::services::upload_worker::ProgressReporter;
use crate::utils::error::AppResult;

/// 照片增删改查接口（不含上传）
pub trait PhotoApi: Send + Sync + 'static {
    /// GET /photos
    fn list_photos(&self) -> impl Future<Output = AppResult<Vec<Photo>>> + Send;

    /// PATCH /photos/{id}
    fn update_photo(
        &self,
        id: PhotoId,
        update: &PhotoUpdate,
    ) -> impl Future<Output = AppResult<Photo>> + Send;

    /// DELETE /photos/{id}
    fn delete_photo(&self, id: PhotoId) -> impl Future<Output = AppResult<()>> + Send;
}

/// 上传传输层失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// 收到了非 2xx 响应
    #[error("HTTP {0}")]
    Status(u16),
    /// 没有收到响应
    #[error("网络错误: {0}")]
    Network(String),
}

/// POST /photos 的传输层
///
/// 实现方必须在发送字节时调用 `reporter.progress`，在全部字节发出、
/// 尚未收到响应时调用 `reporter.sent`。
pub trait UploadTransport: Send + Sync + 'static {
    fn upload(
        &self,
        file: UploadFile,
        reporter: ProgressReporter,
    ) -> impl Future<Output = Result<Photo, TransportError>> + Send;
}
