//! 照片数据模型
//!
//! 字段与服务端 `/photos` 接口的 JSON 一致（snake_case）

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 照片 ID（服务端分配）
pub type PhotoId = i64;

/// 照片信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    /// 照片ID
    pub id: PhotoId,
    /// 原始文件名（上传时唯一）
    pub name: String,
    /// 原图地址
    pub original_url: String,
    /// 中图地址
    #[serde(default)]
    pub medium_url: Option<String>,
    /// 小图地址
    #[serde(default)]
    pub small_url: Option<String>,
    /// 缩略图地址
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// 排序位置，收敛后为 [0, N) 的排列
    #[serde(default)]
    pub sort_order: i32,
    /// 标题
    #[serde(default)]
    pub title: Option<String>,
    /// 相机
    #[serde(default)]
    pub camera: Option<String>,
    /// 镜头
    #[serde(default)]
    pub lens: Option<String>,
    /// ISO
    #[serde(default)]
    pub iso: Option<i32>,
    /// 光圈
    #[serde(default)]
    pub aperture: Option<String>,
    /// 快门速度
    #[serde(default)]
    pub shutter_speed: Option<String>,
    /// 焦距
    #[serde(default)]
    pub focal_length: Option<String>,
    /// 拍摄时间
    #[serde(default)]
    pub taken_at: Option<String>,
    /// 创建时间
    #[serde(default)]
    pub created_at: Option<String>,
    /// 发布时间，存在即表示已发布
    #[serde(default)]
    pub posted_at: Option<String>,
    /// 发布标题
    #[serde(default)]
    pub post_title: Option<String>,
    /// 发布摘要
    #[serde(default)]
    pub post_summary: Option<String>,
}

/// 图片尺寸（从小到大）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Thumbnail,
    Small,
    Medium,
    Original,
}

impl Photo {
    /// 创建只含必填字段的照片（主要用于测试和占位）
    pub fn new(id: PhotoId, name: impl Into<String>, original_url: impl Into<String>, sort_order: i32) -> Self {
        Self {
            id,
            name: name.into(),
            original_url: original_url.into(),
            medium_url: None,
            small_url: None,
            thumbnail_url: None,
            sort_order,
            title: None,
            camera: None,
            lens: None,
            iso: None,
            aperture: None,
            shutter_speed: None,
            focal_length: None,
            taken_at: None,
            created_at: None,
            posted_at: None,
            post_title: None,
            post_summary: None,
        }
    }

    /// 按尺寸取图片地址，缺失时依次退到更大的尺寸，最后是原图
    pub fn url_for(&self, size: ImageSize) -> &str {
        let candidates = [
            (ImageSize::Thumbnail, self.thumbnail_url.as_deref()),
            (ImageSize::Small, self.small_url.as_deref()),
            (ImageSize::Medium, self.medium_url.as_deref()),
        ];
        candidates
            .iter()
            .filter(|(s, _)| *s >= size)
            .find_map(|(_, url)| url.filter(|u| !u.is_empty()))
            .unwrap_or(&self.original_url)
    }

    /// 显示标题：发布标题 > 标题 > 文件名
    pub fn display_title(&self) -> &str {
        [self.post_title.as_deref(), self.title.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or(&self.name)
    }

    /// 是否已发布
    pub fn is_published(&self) -> bool {
        self.posted_at.is_some()
    }

    /// 拍摄日期（YYYY-MM-DD），没有拍摄时间时用创建时间
    pub fn taken_at_display(&self) -> Option<String> {
        let raw = self.taken_at.as_deref().or(self.created_at.as_deref())?;
        parse_timestamp(raw).map(|dt| dt.format("%Y-%m-%d").to_string())
    }
}

/// 解析服务端时间戳，支持 RFC 3339 和无时区的 ISO-8601
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// 用于 PATCH /photos/{id} 的输入结构
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PhotoUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

impl PhotoUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn sort_order(sort_order: i32) -> Self {
        Self {
            sort_order: Some(sort_order),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.name.is_none() && self.sort_order.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_new() {
        let photo = Photo::new(3, "a.jpg", "https://cdn/full/a.jpg", 2);
        assert_eq!(photo.id, 3);
        assert_eq!(photo.sort_order, 2);
        assert!(!photo.is_published());
        assert_eq!(photo.display_title(), "a.jpg");
    }

    #[test]
    fn test_url_fallback() {
        let mut photo = Photo::new(1, "a.jpg", "orig", 0);
        assert_eq!(photo.url_for(ImageSize::Thumbnail), "orig");

        photo.small_url = Some("small".into());
        assert_eq!(photo.url_for(ImageSize::Thumbnail), "small");
        assert_eq!(photo.url_for(ImageSize::Small), "small");
        assert_eq!(photo.url_for(ImageSize::Medium), "orig");

        photo.thumbnail_url = Some("thumb".into());
        assert_eq!(photo.url_for(ImageSize::Thumbnail), "thumb");
        assert_eq!(photo.url_for(ImageSize::Original), "orig");
    }

    #[test]
    fn test_display_title_chain() {
        let mut photo = Photo::new(1, "a.jpg", "orig", 0);
        photo.title = Some("  ".into());
        assert_eq!(photo.display_title(), "a.jpg");
        photo.title = Some("Sunset".into());
        assert_eq!(photo.display_title(), "Sunset");
        photo.post_title = Some("Evening post".into());
        assert_eq!(photo.display_title(), "Evening post");
    }

    #[test]
    fn test_taken_at_display() {
        let mut photo = Photo::new(1, "a.jpg", "orig", 0);
        assert_eq!(photo.taken_at_display(), None);

        photo.created_at = Some("2024-03-05T10:11:12.123456".into());
        assert_eq!(photo.taken_at_display().as_deref(), Some("2024-03-05"));

        photo.taken_at = Some("2023-12-31T23:00:00+00:00".into());
        assert_eq!(photo.taken_at_display().as_deref(), Some("2023-12-31"));

        photo.taken_at = Some("not a date".into());
        assert_eq!(photo.taken_at_display(), None);
    }

    #[test]
    fn test_deserialize_server_payload() {
        let json = r#"{
            "id": 9, "name": "b.jpg", "original_url": "https://x/full/b.jpg",
            "small_url": null, "sort_order": 4, "iso": 200,
            "created_at": "2024-01-01T00:00:00", "posted_at": null
        }"#;
        let photo: Photo = serde_json::from_str(json).unwrap();
        assert_eq!(photo.id, 9);
        assert_eq!(photo.sort_order, 4);
        assert_eq!(photo.iso, Some(200));
        assert!(photo.thumbnail_url.is_none());
    }

    #[test]
    fn test_update_skips_absent_fields() {
        let json = serde_json::to_string(&PhotoUpdate::sort_order(2)).unwrap();
        assert_eq!(json, r#"{"sort_order":2}"#);
        assert!(PhotoUpdate::default().is_empty());
    }
}
