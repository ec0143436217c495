//! 排序和标题补丁的后台发送
//!
//! 补丁发出后不等待、不重试、不回滚。失败只记录日志并发出
//! `photo-persist-failed` 事件；返回的句柄供短生命周期的调用方等待。

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::events::{names, EventSinkExt, SharedEventSink};
use crate::models::{PhotoId, PhotoUpdate};
use crate::services::api::PhotoApi;
use crate::services::order_model::{PositionPatch, TitlePatch};

/// `photo-persist-failed` 事件内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistFailedPayload {
    pub id: PhotoId,
    pub message: String,
}

/// 发送全部位置补丁，每条一个任务
pub fn spawn_position_patches<A: PhotoApi>(
    api: Arc<A>,
    events: SharedEventSink,
    patches: Vec<PositionPatch>,
) -> Vec<JoinHandle<bool>> {
    if !patches.is_empty() {
        tracing::info!(count = patches.len(), "发送排序补丁");
    }
    patches
        .into_iter()
        .map(|patch| spawn_update(api.clone(), events.clone(), patch.id, patch.to_update()))
        .collect()
}

pub fn spawn_title_patch<A: PhotoApi>(
    api: Arc<A>,
    events: SharedEventSink,
    patch: TitlePatch,
) -> JoinHandle<bool> {
    spawn_update(api, events, patch.id, patch.to_update())
}

fn spawn_update<A: PhotoApi>(
    api: Arc<A>,
    events: SharedEventSink,
    id: PhotoId,
    update: PhotoUpdate,
) -> JoinHandle<bool> {
    tokio::spawn(async move {
        match api.update_photo(id, &update).await {
            Ok(_) => {
                tracing::debug!(photo_id = id, "补丁已保存");
                true
            }
            Err(e) => {
                tracing::warn!(photo_id = id, "保存照片失败: {}", e);
                events.emit_typed(
                    names::PHOTO_PERSIST_FAILED,
                    &PersistFailedPayload {
                        id,
                        message: e.to_string(),
                    },
                );
                false
            }
        }
    })
}

/// 等待全部补丁，返回成功数
pub async fn join_patches(handles: Vec<JoinHandle<bool>>) -> usize {
    let mut saved = 0;
    for handle in handles {
        match handle.await {
            Ok(true) => saved += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!("补丁任务异常退出: {}", e),
        }
    }
    saved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingEventSink;
    use crate::services::testing::{photos, FakeApi};

    #[tokio::test]
    async fn test_failed_patch_is_reported_not_raised() {
        let api = Arc::new(FakeApi::new(photos(3)));
        api.fail_updates_for(2);
        let sink = Arc::new(RecordingEventSink::new());

        let patches = vec![
            PositionPatch { id: 1, sort_order: 1 },
            PositionPatch { id: 2, sort_order: 0 },
        ];
        let handles = spawn_position_patches(api.clone(), sink.clone(), patches);
        assert_eq!(join_patches(handles).await, 1);

        assert_eq!(api.server_photo(1).unwrap().sort_order, 1);
        assert_eq!(api.server_photo(2).unwrap().sort_order, 1);

        let failures = sink.payloads(names::PHOTO_PERSIST_FAILED);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0]["id"], 2);
    }

    #[tokio::test]
    async fn test_title_patch_body() {
        let api = Arc::new(FakeApi::new(photos(1)));
        let sink = Arc::new(RecordingEventSink::new());

        let handle = spawn_title_patch(
            api.clone(),
            sink,
            TitlePatch { id: 1, title: "Dusk".into() },
        );
        assert!(handle.await.unwrap());

        let (id, update) = api.patches().remove(0);
        assert_eq!(id, 1);
        assert_eq!(update, PhotoUpdate::title("Dusk"));
        assert_eq!(api.server_photo(1).unwrap().title.as_deref(), Some("Dusk"));
    }
}
