//! photoshelf 数据模型模块

pub mod photo;
pub mod settings;
pub mod upload;

// 重新导出常用类型
pub use photo::{ImageSize, Photo, PhotoId, PhotoUpdate};
pub use settings::{ApiSettings, AppSettings, ReorderSettings, UploadSettings};
pub use upload::{UploadFile, UploadId, UploadRecord, UploadSource, UploadStatus};
