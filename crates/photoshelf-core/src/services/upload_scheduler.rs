//! 有界并发上传调度器
//!
//! 最多同时运行 K 个上传任务，任何一个任务结束就补位，
//! 全部文件到达终止状态时发出且只发出一次排空事件。

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::{self, JoinError, JoinSet};

use crate::events::{names, EventSinkExt, SharedEventSink};
use crate::jobs::{BatchId, CancelToken};
use crate::models::{Photo, UploadFile, UploadId, UploadStatus};
use crate::services::api::UploadTransport;
use crate::services::upload_panel::UploadPanel;
use crate::services::upload_queue::UploadQueue;
use crate::services::upload_worker::{run_worker, FailureReason, UploadEvent, WorkerOutcome};

/// 调度单元：面板上的记录 ID 和对应文件
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub record_id: UploadId,
    pub file: UploadFile,
}

/// 批次结果
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub total: usize,
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
    pub uploaded: Vec<Photo>,
    /// 批次中途被取消
    pub cancelled: bool,
}

/// 上传调度器
pub struct UploadScheduler<T: UploadTransport> {
    transport: Arc<T>,
    panel: Arc<UploadPanel>,
    events: SharedEventSink,
    concurrency: usize,
}

impl<T: UploadTransport> UploadScheduler<T> {
    pub fn new(
        transport: Arc<T>,
        panel: Arc<UploadPanel>,
        events: SharedEventSink,
        concurrency: usize,
    ) -> Self {
        Self {
            transport,
            panel,
            events,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// 运行一个批次直到排空。
    ///
    /// 每个成功上传的照片会发送到 `refresh`（如果提供），用于刷新照片列表。
    /// 取消后不再启动新文件，未开始的文件记为 "Upload cancelled"。
    pub async fn run(
        &self,
        jobs: Vec<UploadJob>,
        cancel: &CancelToken,
        refresh: Option<&UnboundedSender<Photo>>,
    ) -> BatchReport {
        let total = jobs.len();
        let mut report = BatchReport {
            batch_id: cancel.batch_id(),
            total,
            ..Default::default()
        };
        if total == 0 {
            tracing::debug!(batch = cancel.batch_id(), "空批次，无需调度");
            return report;
        }

        tracing::info!(
            batch = cancel.batch_id(),
            total,
            concurrency = self.concurrency,
            "开始上传批次"
        );

        let mut slots: Vec<Option<UploadJob>> = jobs.into_iter().map(Some).collect();
        let mut queue = UploadQueue::new(total, self.concurrency);
        let mut workers: JoinSet<WorkerOutcome> = JoinSet::new();
        // 任务 ID 到面板记录，任务异常退出时据此把记录置为失败
        let mut running: HashMap<task::Id, UploadId> = HashMap::new();

        loop {
            if cancel.is_cancelled() {
                let (pending, _) = queue.cancel_pending();
                if !pending.is_empty() {
                    tracing::info!(batch = cancel.batch_id(), count = pending.len(), "批次已取消");
                }
                for index in pending {
                    if let Some(job) = slots[index].take() {
                        self.panel
                            .apply(job.record_id, &UploadEvent::Failed(FailureReason::Cancelled));
                        report.failed += 1;
                    }
                }
            }

            for index in queue.fill() {
                if let Some(job) = slots[index].take() {
                    let record_id = job.record_id;
                    running.insert(self.spawn_worker(&mut workers, job), record_id);
                }
            }

            if queue.is_drained() {
                break;
            }

            match workers.join_next_with_id().await {
                Some(Ok((task, outcome))) => {
                    running.remove(&task);
                    self.record_outcome(&mut report, outcome, refresh);
                    queue.finish();
                }
                Some(Err(e)) => {
                    self.record_lost(&mut report, running.remove(&e.id()), &e);
                    queue.finish();
                }
                None => {
                    tracing::error!(
                        completed = queue.completed(),
                        total,
                        "没有进行中的任务但批次未排空"
                    );
                    break;
                }
            }
        }

        if queue.is_drained() {
            tracing::info!(
                batch = report.batch_id,
                done = report.done,
                skipped = report.skipped,
                failed = report.failed,
                "上传批次完成"
            );
            self.events.emit_typed(names::UPLOAD_BATCH_DRAINED, &report);
        }
        report
    }

    fn spawn_worker(&self, workers: &mut JoinSet<WorkerOutcome>, job: UploadJob) -> task::Id {
        let transport = self.transport.clone();
        let panel = self.panel.clone();

        workers.spawn(async move {
            let id = job.record_id;
            let name = job.file.name.clone();
            let worker = run_worker(transport, panel.clone(), id, job.file);

            match AssertUnwindSafe(worker).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::error!(name = %name, "上传任务 panic");
                    let status = panel
                        .apply(id, &UploadEvent::Failed(FailureReason::Crashed))
                        .map(|record| record.status)
                        .unwrap_or(UploadStatus::Error);
                    WorkerOutcome {
                        id,
                        name,
                        status,
                        photo: None,
                    }
                }
            }
        })
        .id()
    }

    /// 任务没有产出结果就结束了（被中止或运行时关闭）
    fn record_lost(&self, report: &mut BatchReport, record_id: Option<UploadId>, error: &JoinError) {
        tracing::warn!("上传任务异常退出: {}", error);
        if let Some(id) = record_id {
            self.panel.apply(id, &UploadEvent::Failed(FailureReason::Crashed));
        }
        report.failed += 1;
    }

    fn record_outcome(
        &self,
        report: &mut BatchReport,
        outcome: WorkerOutcome,
        refresh: Option<&UnboundedSender<Photo>>,
    ) {
        match outcome.status {
            UploadStatus::Done => {
                report.done += 1;
                if let Some(photo) = outcome.photo {
                    self.events.emit_typed(names::PHOTO_UPLOADED, &photo);
                    if let Some(tx) = refresh {
                        if tx.send(photo.clone()).is_err() {
                            tracing::debug!("刷新通道已关闭");
                        }
                    }
                    report.uploaded.push(photo);
                }
            }
            UploadStatus::Skipped => report.skipped += 1,
            UploadStatus::Error => report.failed += 1,
            status => {
                tracing::warn!(name = %outcome.name, status = status.name(), "上传任务以非终止状态结束");
                report.failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingEventSink;
    use crate::jobs::BatchTracker;
    use crate::models::UploadRecord;
    use crate::services::testing::{FakeOutcome, FakeTransport};
    use std::time::Duration;

    struct Fixture {
        transport: Arc<FakeTransport>,
        panel: Arc<UploadPanel>,
        sink: Arc<RecordingEventSink>,
        tracker: BatchTracker,
    }

    impl Fixture {
        fn new() -> Self {
            let sink = Arc::new(RecordingEventSink::new());
            Self {
                transport: Arc::new(FakeTransport::new()),
                panel: Arc::new(UploadPanel::new(sink.clone())),
                sink,
                tracker: BatchTracker::new(),
            }
        }

        fn scheduler(&self, k: usize) -> UploadScheduler<FakeTransport> {
            UploadScheduler::new(self.transport.clone(), self.panel.clone(), self.sink.clone(), k)
        }

        fn jobs(&self, names: &[&str]) -> Vec<UploadJob> {
            names
                .iter()
                .map(|name| {
                    let record = UploadRecord::uploading(*name);
                    let job = UploadJob {
                        record_id: record.id,
                        file: UploadFile::from_bytes(*name, vec![0u8; 1000]),
                    };
                    self.panel.insert([record]);
                    job
                })
                .collect()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_never_exceeds_cap() {
        let fx = Fixture::new();
        fx.transport.set_delay("f1", Duration::from_millis(400));
        fx.transport.set_delay("f4", Duration::from_millis(30));
        let jobs = fx.jobs(&["f0", "f1", "f2", "f3", "f4", "f5", "f6"]);
        let token = fx.tracker.start_batch();

        let report = fx.scheduler(3).run(jobs, &token, None).await;

        assert_eq!(fx.transport.max_in_flight(), 3);
        assert_eq!(report.total, 7);
        assert_eq!(report.done, 7);
        assert_eq!(report.uploaded.len(), 7);
        assert_eq!(fx.sink.count(names::UPLOAD_BATCH_DRAINED), 1);
        assert_eq!(fx.panel.summary().done, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_slot_is_strictly_sequential() {
        let fx = Fixture::new();
        fx.transport.set_delay("b", Duration::from_millis(10));
        let jobs = fx.jobs(&["a", "b", "c"]);
        let token = fx.tracker.start_batch();

        fx.scheduler(1).run(jobs, &token, None).await;

        assert_eq!(
            fx.transport.log(),
            vec!["start:a", "end:a", "start:b", "end:b", "start:c", "end:c"]
        );
        assert_eq!(fx.transport.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_affect_siblings() {
        let fx = Fixture::new();
        fx.transport.set_outcome("bad", FakeOutcome::Status(500));
        fx.transport.set_outcome("offline", FakeOutcome::Network);
        fx.transport.set_outcome("dup", FakeOutcome::Status(409));
        let jobs = fx.jobs(&["ok1", "bad", "offline", "dup", "ok2"]);
        let ids: Vec<UploadId> = jobs.iter().map(|j| j.record_id).collect();
        let token = fx.tracker.start_batch();

        let report = fx.scheduler(2).run(jobs, &token, None).await;

        assert_eq!((report.done, report.failed, report.skipped), (2, 2, 1));
        let bad = fx.panel.get(ids[1]).unwrap();
        assert_eq!(bad.error.as_deref(), Some("HTTP 500"));
        let offline = fx.panel.get(ids[2]).unwrap();
        assert_eq!(offline.error.as_deref(), Some("Network error"));
        let dup = fx.panel.get(ids[3]).unwrap();
        assert_eq!(dup.status, UploadStatus::Skipped);
        assert_eq!(dup.error, None);
        assert_eq!(fx.panel.get(ids[4]).unwrap().status, UploadStatus::Done);
        assert_eq!(fx.sink.count(names::UPLOAD_BATCH_DRAINED), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_worker_is_isolated() {
        let fx = Fixture::new();
        fx.transport.panic_on("boom");
        let jobs = fx.jobs(&["a", "boom", "c"]);
        let boom_id = jobs[1].record_id;
        let token = fx.tracker.start_batch();

        let report = fx.scheduler(3).run(jobs, &token, None).await;

        assert_eq!(report.done, 2);
        assert_eq!(report.failed, 1);
        let rec = fx.panel.get(boom_id).unwrap();
        assert_eq!(rec.status, UploadStatus::Error);
        assert_eq!(rec.error.as_deref(), Some("Upload worker crashed"));
        assert_eq!(fx.sink.count(names::UPLOAD_BATCH_DRAINED), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_new_starts() {
        let fx = Fixture::new();
        let jobs = fx.jobs(&["f0", "f1", "f2", "f3"]);
        let ids: Vec<UploadId> = jobs.iter().map(|j| j.record_id).collect();
        let token = fx.tracker.start_batch();
        let scheduler = fx.scheduler(1);

        let canceller = token.clone();
        let (report, _) = tokio::join!(scheduler.run(jobs, &token, None), async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        assert_eq!(fx.transport.calls(), vec!["f0".to_string()]);
        assert_eq!(report.done, 1);
        assert_eq!(report.failed, 3);
        for id in &ids[1..] {
            let rec = fx.panel.get(*id).unwrap();
            assert_eq!(rec.status, UploadStatus::Error);
            assert_eq!(rec.error.as_deref(), Some("Upload cancelled"));
        }
        assert_eq!(fx.sink.count(names::UPLOAD_BATCH_DRAINED), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successes_feed_refresh_channel() {
        let fx = Fixture::new();
        fx.transport.set_outcome("b", FakeOutcome::Status(409));
        let jobs = fx.jobs(&["a", "b", "c"]);
        let token = fx.tracker.start_batch();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        fx.scheduler(3).run(jobs, &token, Some(&tx)).await;
        drop(tx);

        let mut uploaded = Vec::new();
        while let Some(photo) = rx.recv().await {
            uploaded.push(photo.name);
        }
        uploaded.sort();
        assert_eq!(uploaded, vec!["a", "c"]);
        assert_eq!(fx.sink.count(names::PHOTO_UPLOADED), 2);
    }

    #[tokio::test]
    async fn test_aborted_worker_leaves_terminal_record() {
        let fx = Fixture::new();
        let jobs = fx.jobs(&["lost"]);
        let id = jobs[0].record_id;
        fx.panel.apply(id, &UploadEvent::Sent);

        let mut set: JoinSet<WorkerOutcome> = JoinSet::new();
        let handle = set.spawn(std::future::pending());
        let task = handle.id();
        handle.abort();
        let err = set.join_next_with_id().await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.id(), task);

        let mut report = BatchReport::default();
        fx.scheduler(1).record_lost(&mut report, Some(id), &err);

        assert_eq!(report.failed, 1);
        let rec = fx.panel.get(id).unwrap();
        assert_eq!(rec.status, UploadStatus::Error);
        assert_eq!(rec.error.as_deref(), Some("Upload worker crashed"));
    }

    #[tokio::test]
    async fn test_empty_batch_returns_immediately() {
        let fx = Fixture::new();
        let token = fx.tracker.start_batch();
        let report = fx.scheduler(3).run(Vec::new(), &token, None).await;
        assert_eq!(report.total, 0);
        assert_eq!(fx.sink.count(names::UPLOAD_BATCH_DRAINED), 0);
    }
}
