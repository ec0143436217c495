//! 照片服务端接口的 HTTP 实现

pub mod http;

pub use http::HttpPhotoApi;
