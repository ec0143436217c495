//! 上传面板状态
//!
//! 上传 ID 到记录的映射，界面从这里渲染。所有修改都在锁内对旧记录
//! 应用纯函数迁移，变化通过 EventSink 通知订阅方。

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::events::{names, EventSinkExt, SharedEventSink};
use crate::jobs::{BatchId, BatchTracker};
use crate::models::{UploadId, UploadRecord, UploadStatus};
use crate::services::upload_worker::{transition, UploadEvent};

/// 面板各状态计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSummary {
    pub total: usize,
    pub uploading: usize,
    pub processing: usize,
    pub done: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// 上传面板
pub struct UploadPanel {
    /// 按加入顺序保存，便于界面稳定渲染
    records: Mutex<Vec<UploadRecord>>,
    events: SharedEventSink,
}

impl UploadPanel {
    pub fn new(events: SharedEventSink) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            events,
        }
    }

    /// 加入新记录（同 ID 的旧记录会被替换）
    pub fn insert<I>(&self, records: I)
    where
        I: IntoIterator<Item = UploadRecord>,
    {
        let added: Vec<UploadRecord> = records.into_iter().collect();
        {
            let mut guard = self.records.lock();
            for record in &added {
                match guard.iter_mut().find(|r| r.id == record.id) {
                    Some(existing) => *existing = record.clone(),
                    None => guard.push(record.clone()),
                }
            }
        }
        for record in &added {
            self.events.emit_typed(names::UPLOAD_PROGRESS, record);
        }
    }

    /// 对指定记录应用事件，返回迁移后的记录；记录不存在时返回 None
    pub fn apply(&self, id: UploadId, event: &UploadEvent) -> Option<UploadRecord> {
        let (updated, changed) = {
            let mut guard = self.records.lock();
            let slot = guard.iter_mut().find(|r| r.id == id)?;
            let next = transition(slot, event);
            let changed = next != *slot;
            if changed {
                *slot = next.clone();
            }
            (next, changed)
        };

        if changed {
            tracing::debug!(
                upload = %id,
                status = updated.status.name(),
                progress = updated.progress,
                "上传记录更新"
            );
            self.events.emit_typed(names::UPLOAD_PROGRESS, &updated);
        }
        Some(updated)
    }

    pub fn get(&self, id: UploadId) -> Option<UploadRecord> {
        self.records.lock().iter().find(|r| r.id == id).cloned()
    }

    /// 当前所有记录的快照
    pub fn snapshot(&self) -> Vec<UploadRecord> {
        self.records.lock().clone()
    }

    pub fn summary(&self) -> PanelSummary {
        let guard = self.records.lock();
        let mut summary = PanelSummary {
            total: guard.len(),
            ..Default::default()
        };
        for record in guard.iter() {
            match record.status {
                UploadStatus::Uploading => summary.uploading += 1,
                UploadStatus::Processing => summary.processing += 1,
                UploadStatus::Done => summary.done += 1,
                UploadStatus::Error => summary.failed += 1,
                UploadStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// 清空面板，返回移除的记录数
    pub fn clear(&self) -> usize {
        let mut guard = self.records.lock();
        let removed = guard.len();
        guard.clear();
        removed
    }
}

/// 延迟清空面板
///
/// 由最后一个完成的批次调用。到期时如果又有批次开始过，则不清空，
/// 交给那些批次中最后完成的一个。返回的句柄在清空发生时产出 true。
pub fn schedule_clear(
    panel: Arc<UploadPanel>,
    tracker: Arc<BatchTracker>,
    batch_id: BatchId,
    delay: Duration,
) -> JoinHandle<bool> {
    let generation = tracker.latest_batch();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        if tracker.latest_batch() != generation || tracker.active_batch_count() > 0 {
            tracing::debug!(batch = batch_id, "有新批次在进行，跳过清空面板");
            return false;
        }

        let removed = panel.clear();
        tracing::debug!(batch = batch_id, removed, "上传面板已清空");
        panel.events.emit_typed(names::UPLOAD_PANEL_CLEARED, &batch_id);
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingEventSink;
    use crate::services::upload_worker::FailureReason;

    fn panel_with_sink() -> (Arc<UploadPanel>, Arc<RecordingEventSink>) {
        let sink = Arc::new(RecordingEventSink::new());
        (Arc::new(UploadPanel::new(sink.clone())), sink)
    }

    #[test]
    fn test_insert_and_apply() {
        let (panel, sink) = panel_with_sink();
        let rec = UploadRecord::uploading("a.jpg");
        let id = rec.id;
        panel.insert([rec, UploadRecord::skipped("b.jpg")]);
        assert_eq!(panel.len(), 2);
        assert_eq!(sink.count(names::UPLOAD_PROGRESS), 2);

        let updated = panel
            .apply(id, &UploadEvent::Progress { loaded: 50, total: 100 })
            .unwrap();
        assert_eq!(updated.progress, 50);
        assert_eq!(panel.get(id).unwrap().progress, 50);
        assert_eq!(sink.count(names::UPLOAD_PROGRESS), 3);

        // 同样的进度不会产生新事件
        panel.apply(id, &UploadEvent::Progress { loaded: 50, total: 100 });
        assert_eq!(sink.count(names::UPLOAD_PROGRESS), 3);
    }

    #[test]
    fn test_apply_unknown_id() {
        let (panel, _) = panel_with_sink();
        assert!(panel.apply(uuid::Uuid::new_v4(), &UploadEvent::Sent).is_none());
    }

    #[test]
    fn test_summary_counts() {
        let (panel, _) = panel_with_sink();
        let a = UploadRecord::uploading("a.jpg");
        let b = UploadRecord::uploading("b.jpg");
        let c = UploadRecord::uploading("c.jpg");
        let (a_id, b_id) = (a.id, b.id);
        panel.insert([a, b, c, UploadRecord::skipped("d.jpg")]);

        panel.apply(a_id, &UploadEvent::Sent);
        panel.apply(b_id, &UploadEvent::Failed(FailureReason::Network));

        let summary = panel.summary();
        assert_eq!(
            summary,
            PanelSummary {
                total: 4,
                uploading: 1,
                processing: 1,
                done: 0,
                failed: 1,
                skipped: 1,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_clear() {
        let (panel, sink) = panel_with_sink();
        let tracker = Arc::new(BatchTracker::new());
        let batch = tracker.start_batch();
        panel.insert([UploadRecord::skipped("a.jpg")]);
        tracker.complete_batch(batch.batch_id());

        let handle = schedule_clear(
            panel.clone(),
            tracker.clone(),
            batch.batch_id(),
            Duration::from_millis(1500),
        );

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(panel.len(), 1);

        assert!(handle.await.unwrap());
        assert!(panel.is_empty());
        assert_eq!(sink.count(names::UPLOAD_PANEL_CLEARED), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_skipped_when_newer_batch_started() {
        let (panel, _) = panel_with_sink();
        let tracker = Arc::new(BatchTracker::new());
        let first = tracker.start_batch();
        tracker.complete_batch(first.batch_id());
        panel.insert([UploadRecord::skipped("a.jpg")]);

        let handle = schedule_clear(
            panel.clone(),
            tracker.clone(),
            first.batch_id(),
            Duration::from_millis(100),
        );
        let _second = tracker.start_batch();

        assert!(!handle.await.unwrap());
        assert_eq!(panel.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_by_older_batch_finishing_last() {
        let (panel, _) = panel_with_sink();
        let tracker = Arc::new(BatchTracker::new());
        let slow = tracker.start_batch();
        let fast = tracker.start_batch();
        panel.insert([UploadRecord::skipped("a.jpg"), UploadRecord::skipped("b.jpg")]);

        assert!(!tracker.complete_batch(fast.batch_id()));
        assert!(tracker.complete_batch(slow.batch_id()));

        let handle = schedule_clear(
            panel.clone(),
            tracker.clone(),
            slow.batch_id(),
            Duration::from_millis(100),
        );
        assert!(handle.await.unwrap());
        assert!(panel.is_empty());
    }
}
