//! 排序和标题命令

use photoshelf_core::services::join_patches;
use photoshelf_core::{AppError, CommandError, PhotoId};
use serde::Serialize;

use crate::AppState;

/// 移动结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSummary {
    /// 发出的补丁数
    pub patched: usize,
    /// 服务端确认的补丁数
    pub saved: usize,
}

/// 移动照片并等待排序补丁完成
pub async fn move_photo(state: &AppState, from: usize, to: usize) -> Result<MoveSummary, CommandError> {
    let count = state.gallery.refresh().await?;
    if from >= count || to >= count {
        return Err(AppError::InvalidInput(format!(
            "位置超出范围: 共 {} 张照片，位置从 0 开始",
            count
        ))
        .into());
    }

    let handles = state.gallery.move_and_commit(from, to);
    let patched = handles.len();
    let saved = join_patches(handles).await;
    Ok(MoveSummary { patched, saved })
}

/// 设置标题，未修改时不发请求。返回是否保存成功
pub async fn set_title(state: &AppState, id: PhotoId, text: &str) -> Result<bool, CommandError> {
    state.gallery.refresh().await?;
    if !state.gallery.set_title_draft(id, text) {
        return Err(AppError::NotFound(format!("照片 {}", id)).into());
    }

    match state.gallery.commit_title(id) {
        Some(handle) => Ok(handle.await.unwrap_or_else(|e| {
            tracing::warn!("标题任务异常退出: {}", e);
            false
        })),
        None => {
            tracing::info!(photo_id = id, "标题未变化");
            Ok(false)
        }
    }
}
