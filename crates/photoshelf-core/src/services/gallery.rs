//! 图库控制器
//!
//! 持有顺序模型和拖拽手势，是照片列表唯一的写入方。模型放在
//! parking_lot 锁里，任何 `.await` 之前都会先释放锁。

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::events::{names, EventSinkExt, SharedEventSink};
use crate::models::{Photo, PhotoId, PhotoUpdate, ReorderSettings};
use crate::services::api::PhotoApi;
use crate::services::drag::{DragController, DropOutcome, DropZone, Point};
use crate::services::order_model::OrderModel;
use crate::services::order_sync::{spawn_position_patches, spawn_title_patch};
use crate::utils::error::{AppError, AppResult};

/// 一次拖拽手势的状态
struct DragSession {
    controller: DragController,
    /// 按下时的顺序，取消时恢复
    snapshot: Option<Vec<PhotoId>>,
}

/// 松手后的结果和发出的补丁任务
#[derive(Debug)]
pub struct DragEnd {
    pub outcome: DropOutcome,
    pub patches: Vec<JoinHandle<bool>>,
}

/// 图库服务
pub struct GalleryService<A: PhotoApi> {
    api: Arc<A>,
    model: Mutex<OrderModel>,
    drag: Mutex<DragSession>,
    events: SharedEventSink,
}

impl<A: PhotoApi> GalleryService<A> {
    pub fn new(api: Arc<A>, events: SharedEventSink, reorder: &ReorderSettings) -> Self {
        Self {
            api,
            model: Mutex::new(OrderModel::default()),
            drag: Mutex::new(DragSession {
                controller: DragController::from_settings(reorder),
                snapshot: None,
            }),
            events,
        }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// 拉取服务端列表并与本地合并，返回照片数量
    pub async fn refresh(&self) -> AppResult<usize> {
        let photos = self.api.list_photos().await?;
        let count = photos.len();

        if self.drag_cancel() {
            tracing::debug!("刷新照片列表，取消进行中的拖拽");
        }
        let ids = {
            let mut model = self.model.lock();
            model.reconcile(photos);
            model.ids()
        };
        tracing::info!(count, "照片列表已刷新");
        self.emit_order(&ids);
        Ok(count)
    }

    /// 当前顺序的照片快照
    pub fn photos(&self) -> Vec<Photo> {
        self.model.lock().photos().to_vec()
    }

    pub fn ids(&self) -> Vec<PhotoId> {
        self.model.lock().ids()
    }

    pub fn known_names(&self) -> Vec<String> {
        self.model.lock().known_names()
    }

    pub fn title_for(&self, id: PhotoId) -> Option<String> {
        self.model.lock().title_for(id).map(str::to_string)
    }

    pub fn get(&self, id: PhotoId) -> Option<Photo> {
        self.model.lock().get(id).cloned()
    }

    /// 加入一张刚上传完成的照片
    pub fn apply_uploaded(&self, photo: Photo) {
        let ids = {
            let mut model = self.model.lock();
            model.insert_uploaded(photo);
            model.ids()
        };
        self.emit_order(&ids);
    }

    /// 持续接收上传成功的照片，直到发送端全部关闭。返回收到的数量
    pub fn spawn_refresh_listener(self: &Arc<Self>, mut rx: UnboundedReceiver<Photo>) -> JoinHandle<usize> {
        let gallery = Arc::clone(self);
        tokio::spawn(async move {
            let mut received = 0;
            while let Some(photo) = rx.recv().await {
                tracing::debug!(photo_id = photo.id, "新照片加入列表");
                gallery.apply_uploaded(photo);
                received += 1;
            }
            received
        })
    }

    /// 移动并立即提交
    pub fn move_and_commit(&self, from: usize, to: usize) -> Vec<JoinHandle<bool>> {
        let (patches, ids) = {
            let mut model = self.model.lock();
            if !model.move_item(from, to) {
                return Vec::new();
            }
            (model.commit(), model.ids())
        };
        tracing::info!(from, to, patches = patches.len(), "照片已移动");
        self.emit_order(&ids);
        spawn_position_patches(self.api.clone(), self.events.clone(), patches)
    }

    /// 更新各项的布局矩形
    pub fn set_layout(&self, zones: Vec<DropZone>) {
        self.drag.lock().controller.set_zones(zones);
    }

    pub fn drag_start(&self, index: usize, at: Point) -> bool {
        let snapshot = self.ids();
        let mut drag = self.drag.lock();
        let pressed = drag.controller.pointer_down(index, at);
        drag.snapshot = pressed.then_some(snapshot);
        pressed
    }

    /// 拖动中，返回预览顺序
    pub fn drag_move(&self, at: Point) -> Vec<PhotoId> {
        let ids = self.ids();
        let mut drag = self.drag.lock();
        drag.controller.pointer_move(at);
        drag.controller.projected_order(&ids)
    }

    pub fn drag_end(&self, at: Point) -> DragEnd {
        let outcome = {
            let mut drag = self.drag.lock();
            drag.snapshot = None;
            drag.controller.pointer_up(at)
        };
        let patches = match outcome {
            DropOutcome::Move { from, to } => self.move_and_commit(from, to),
            DropOutcome::Click { .. } | DropOutcome::NoOp => Vec::new(),
        };
        DragEnd { outcome, patches }
    }

    /// 取消拖拽并恢复按下时的顺序，不提交。返回之前是否在拖拽
    pub fn drag_cancel(&self) -> bool {
        let (was_dragging, snapshot) = {
            let mut drag = self.drag.lock();
            (drag.controller.cancel(), drag.snapshot.take())
        };
        if let Some(snapshot) = snapshot {
            let mut model = self.model.lock();
            if model.ids() != snapshot && !model.restore(&snapshot) {
                tracing::debug!("照片集合已变化，无法恢复拖拽前的顺序");
            }
        }
        was_dragging
    }

    pub fn set_title_draft(&self, id: PhotoId, text: impl Into<String>) -> bool {
        self.model.lock().set_title_draft(id, text)
    }

    pub fn discard_title_draft(&self, id: PhotoId) -> bool {
        self.model.lock().discard_title_draft(id)
    }

    /// 提交标题草稿，未修改时不发请求
    pub fn commit_title(&self, id: PhotoId) -> Option<JoinHandle<bool>> {
        let patch = self.model.lock().commit_title(id)?;
        tracing::info!(photo_id = id, "保存标题");
        Some(spawn_title_patch(self.api.clone(), self.events.clone(), patch))
    }

    /// 重命名，等待服务端返回并合并
    pub async fn rename(&self, id: PhotoId, name: &str) -> AppResult<Photo> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("文件名不能为空".into()));
        }
        if self.get(id).is_none() {
            return Err(AppError::NotFound(format!("照片 {}", id)));
        }

        let photo = self.api.update_photo(id, &PhotoUpdate::name(name)).await?;
        self.model.lock().merge_server_photo(photo.clone());
        tracing::info!(photo_id = id, name = %photo.name, "照片已重命名");
        Ok(photo)
    }

    /// 删除照片，服务端成功后才从本地移除
    pub async fn delete(&self, id: PhotoId) -> AppResult<()> {
        if self.get(id).is_none() {
            return Err(AppError::NotFound(format!("照片 {}", id)));
        }
        self.api.delete_photo(id).await?;

        let ids = {
            let mut model = self.model.lock();
            model.remove(id);
            model.ids()
        };
        tracing::info!(photo_id = id, "照片已删除");
        self.emit_order(&ids);
        Ok(())
    }

    fn emit_order(&self, ids: &[PhotoId]) {
        self.events.emit_typed(names::ORDER_CHANGED, &ids);
    }
}
