//! 照片列表命令

use photoshelf_core::models::Photo;
use photoshelf_core::{CommandError, PhotoId};
use serde::Serialize;

use crate::AppState;

/// 列表中的一行
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRow {
    pub index: usize,
    pub id: PhotoId,
    pub name: String,
    pub title: String,
    pub published: bool,
    pub taken: Option<String>,
}

impl PhotoRow {
    pub fn new(index: usize, photo: &Photo) -> Self {
        Self {
            index,
            id: photo.id,
            name: photo.name.clone(),
            title: photo.display_title().to_string(),
            published: photo.is_published(),
            taken: photo.taken_at_display(),
        }
    }
}

/// 获取照片列表（按显示顺序）
pub async fn list_photos(state: &AppState) -> Result<Vec<PhotoRow>, CommandError> {
    state.gallery.refresh().await?;
    Ok(state
        .gallery
        .photos()
        .iter()
        .enumerate()
        .map(|(index, photo)| PhotoRow::new(index, photo))
        .collect())
}

/// 重命名照片文件
pub async fn rename_photo(state: &AppState, id: PhotoId, name: &str) -> Result<Photo, CommandError> {
    state.gallery.refresh().await?;
    Ok(state.gallery.rename(id, name).await?)
}

/// 删除照片
pub async fn delete_photo(state: &AppState, id: PhotoId) -> Result<(), CommandError> {
    state.gallery.refresh().await?;
    state.gallery.delete(id).await?;
    Ok(())
}
