//! 基于 reqwest 的照片接口
//!
//! 上传请求的 multipart 正文按块流式发送，每发出一块汇报一次进度，
//! 最后一块发出后汇报 sent，随后等待服务端响应。

use std::time::Duration;

use futures_util::stream;
use photoshelf_core::models::{ApiSettings, Photo, PhotoId, PhotoUpdate, UploadFile, UploadSource};
use photoshelf_core::services::{PhotoApi, ProgressReporter, TransportError, UploadTransport};
use photoshelf_core::{AppError, AppResult};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};

/// 照片接口客户端
#[derive(Debug, Clone)]
pub struct HttpPhotoApi {
    client: Client,
    base_url: String,
    timeout: Duration,
    chunk_size: usize,
}

impl HttpPhotoApi {
    /// 创建客户端。上传请求不设超时，其余请求使用 `timeout_secs`
    pub fn new(settings: &ApiSettings, chunk_size: usize) -> AppResult<Self> {
        let base_url = settings.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::Config(format!("接口地址无效: {}", settings.base_url)));
        }

        let timeout = Duration::from_secs(settings.timeout_secs.max(1));
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout,
            chunk_size: chunk_size.max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 非 2xx 时读取 FastAPI 风格的 `detail` 作为错误信息
    async fn check(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Http {
            status: status.as_u16(),
            message: error_detail(&body, status.canonical_reason().unwrap_or("error")),
        })
    }

    async fn read_source(file: &UploadFile) -> std::io::Result<Vec<u8>> {
        match &file.source {
            UploadSource::Memory(bytes) => Ok(bytes.clone()),
            UploadSource::Path(path) => tokio::fs::read(path).await,
        }
    }
}

fn network_error(e: reqwest::Error) -> AppError {
    AppError::Network(e.to_string())
}

/// 从错误响应体里取出可读信息
fn error_detail(body: &str, fallback: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| fallback.to_string())
}

/// 把正文切成固定大小的块
fn chunk_body(bytes: &[u8], chunk_size: usize) -> Vec<Vec<u8>> {
    bytes.chunks(chunk_size.max(1)).map(<[u8]>::to_vec).collect()
}

/// 按扩展名猜测 Content-Type
fn content_type(name: &str) -> String {
    mime_guess::from_path(name).first_or_octet_stream().to_string()
}

impl PhotoApi for HttpPhotoApi {
    async fn list_photos(&self) -> AppResult<Vec<Photo>> {
        let response = self
            .client
            .get(self.url("/photos"))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(network_error)?;
        let photos = Self::check(response)
            .await?
            .json::<Vec<Photo>>()
            .await
            .map_err(network_error)?;
        tracing::debug!(count = photos.len(), "获取照片列表");
        Ok(photos)
    }

    async fn update_photo(&self, id: PhotoId, update: &PhotoUpdate) -> AppResult<Photo> {
        if update.is_empty() {
            return Err(AppError::InvalidInput("更新内容为空".into()));
        }
        let response = self
            .client
            .patch(self.url(&format!("/photos/{}", id)))
            .timeout(self.timeout)
            .json(update)
            .send()
            .await
            .map_err(network_error)?;
        Self::check(response)
            .await?
            .json::<Photo>()
            .await
            .map_err(network_error)
    }

    async fn delete_photo(&self, id: PhotoId) -> AppResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/photos/{}", id)))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(network_error)?;
        Self::check(response).await?;
        Ok(())
    }
}

impl UploadTransport for HttpPhotoApi {
    async fn upload(
        &self,
        file: UploadFile,
        reporter: ProgressReporter,
    ) -> Result<Photo, TransportError> {
        let bytes = Self::read_source(&file).await.map_err(|e| {
            tracing::warn!(name = %file.name, "读取待上传文件失败: {}", e);
            TransportError::Network(e.to_string())
        })?;

        let total = bytes.len() as u64;
        let chunks = chunk_body(&bytes, self.chunk_size);
        drop(bytes);
        if total == 0 {
            reporter.sent();
        }

        let progress = reporter.clone();
        let mut loaded = 0u64;
        let body = stream::iter(chunks.into_iter().map(move |chunk| {
            loaded += chunk.len() as u64;
            progress.progress(loaded, total);
            if loaded >= total {
                progress.sent();
            }
            Ok::<Vec<u8>, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(file.name.clone())
            .mime_str(&content_type(&file.name))
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let mut form = Form::new().part("file", part);
        if let Some(title) = &file.title {
            form = form.text("title", title.clone());
        }

        let response = self
            .client
            .post(self.url("/photos"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        response
            .json::<Photo>()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))
    }
}
