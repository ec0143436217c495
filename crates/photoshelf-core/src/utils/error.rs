//! photoshelf 错误处理模块
//!
//! 定义核心库的错误类型以及命令层使用的错误包装

use serde::Serialize;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 服务端返回非 2xx 状态
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// 网络层失败（未收到响应）
    #[error("网络错误: {0}")]
    Network(String),

    /// 照片或上传记录不存在
    #[error("未找到: {0}")]
    NotFound(String),

    /// 参数无效
    #[error("参数无效: {0}")]
    InvalidInput(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 批次已取消
    #[error("操作已取消")]
    Cancelled,

    /// 通用错误
    #[error("{0}")]
    General(String),
}

impl AppError {
    /// 对应的 HTTP 状态码（仅 Http 变体有）
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// 用于命令返回的错误包装
#[derive(Debug, Serialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
}

impl From<AppError> for CommandError {
    fn from(err: AppError) -> Self {
        let code = match &err {
            AppError::Io(_) => "E_IO_ERROR",
            AppError::Json(_) => "E_JSON",
            AppError::Http { .. } => "E_HTTP",
            AppError::Network(_) => "E_NETWORK",
            AppError::NotFound(_) => "E_NOT_FOUND",
            AppError::InvalidInput(_) => "E_INVALID_INPUT",
            AppError::Config(_) => "E_CONFIG",
            AppError::Cancelled => "E_CANCELLED",
            AppError::General(_) => "E_GENERAL",
        };

        CommandError {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for CommandError {}

/// 应用程序结果类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::Http {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: boom");
        assert_eq!(err.status(), Some(500));
        assert_eq!(AppError::NotFound("photo 7".into()).to_string(), "未找到: photo 7");
    }

    #[test]
    fn test_command_error_conversion() {
        let cmd_err: CommandError = AppError::Network("connection refused".into()).into();
        assert_eq!(cmd_err.code, "E_NETWORK");
        assert!(cmd_err.message.contains("connection refused"));

        let cmd_err: CommandError = AppError::Cancelled.into();
        assert_eq!(cmd_err.code, "E_CANCELLED");
    }

    #[test]
    fn test_command_error_serializes() {
        let cmd_err: CommandError = AppError::InvalidInput("index".into()).into();
        let json = serde_json::to_value(&cmd_err).unwrap();
        assert_eq!(json["code"], "E_INVALID_INPUT");
    }
}
