//! photoshelf 工具模块
//!
//! 包含错误类型

pub mod error;

pub use error::*;
