//! photoshelf 应用层服务

pub mod scanner;

pub use scanner::{collect_images, is_image_file, ScanResult, SUPPORTED_FORMATS};
