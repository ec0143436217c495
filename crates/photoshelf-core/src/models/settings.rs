//! 应用程序设置数据模型

use serde::{Deserialize, Serialize};

/// 服务端接口设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// 照片接口根地址
    pub base_url: String,
    /// 单次请求超时（秒），上传请求不受限制
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:8000"),
            timeout_secs: 30,
        }
    }
}

/// 上传设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadSettings {
    /// 同时上传的文件数上限
    pub concurrency: usize,
    /// 批次结束后清空面板的延迟（毫秒）
    pub clear_delay_ms: u64,
    /// 上传时每块的字节数，决定进度回调的粒度
    pub chunk_size: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            concurrency: 3,
            clear_delay_ms: 1500,
            chunk_size: 64 * 1024,
        }
    }
}

impl UploadSettings {
    /// 并发数至少为 1
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

/// 拖拽排序设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReorderSettings {
    /// 指针移动超过该距离（像素）才算拖拽，否则视为点击
    pub activation_distance: f64,
}

impl Default for ReorderSettings {
    fn default() -> Self {
        Self {
            activation_distance: 8.0,
        }
    }
}

/// 应用程序设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub api: ApiSettings,
    pub upload: UploadSettings,
    pub reorder: ReorderSettings,
    /// 日志级别（trace/debug/info/warn/error）
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            upload: UploadSettings::default(),
            reorder: ReorderSettings::default(),
            log_level: String::from("info"),
        }
    }
}
