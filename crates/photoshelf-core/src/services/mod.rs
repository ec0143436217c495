//! photoshelf 服务模块
//!
//! 上传编排（查重、调度、状态机、面板）和图库排序（顺序模型、拖拽、补丁）

pub mod api;
pub mod drag;
pub mod gallery;
pub mod intake;
pub mod order_model;
pub mod order_sync;
pub mod settings;
pub mod upload_panel;
pub mod upload_queue;
pub mod upload_scheduler;
pub mod upload_worker;
pub mod uploader;

#[cfg(test)]
pub mod testing;

// 重新导出常用类型
pub use api::{PhotoApi, TransportError, UploadTransport};
pub use drag::{closest_center, row_layout, DragController, DropOutcome, DropZone, Point, Rect};
pub use gallery::{DragEnd, GalleryService};
pub use intake::{partition, IntakeResult};
pub use order_model::{OrderModel, PositionPatch, TitlePatch};
pub use order_sync::{join_patches, spawn_position_patches, spawn_title_patch, PersistFailedPayload};
pub use settings::SettingsManager;
pub use upload_panel::{schedule_clear, PanelSummary, UploadPanel};
pub use upload_queue::UploadQueue;
pub use upload_scheduler::{BatchReport, UploadJob, UploadScheduler};
pub use upload_worker::{
    outcome_event, run_worker, transition, FailureReason, ProgressReporter, UploadEvent,
    WorkerOutcome, CANCELLED_MESSAGE, NETWORK_ERROR_MESSAGE,
};
pub use uploader::{BatchOutcome, UploadService};
