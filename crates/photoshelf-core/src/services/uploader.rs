//! 上传控制器
//!
//! 一次 `upload_batch` 调用对应一个批次：查重、把记录放进面板、
//! 有界并发上传，排空后延迟清空面板。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::events::SharedEventSink;
use crate::jobs::{BatchId, BatchTracker};
use crate::models::{Photo, UploadFile, UploadSettings};
use crate::services::api::UploadTransport;
use crate::services::intake::partition;
use crate::services::upload_panel::{schedule_clear, UploadPanel};
use crate::services::upload_scheduler::{BatchReport, UploadJob, UploadScheduler};

/// 上传服务，持有面板和批次登记
pub struct UploadService<T: UploadTransport> {
    transport: Arc<T>,
    panel: Arc<UploadPanel>,
    tracker: Arc<BatchTracker>,
    events: SharedEventSink,
    settings: UploadSettings,
}

impl<T: UploadTransport> UploadService<T> {
    pub fn new(
        transport: Arc<T>,
        tracker: Arc<BatchTracker>,
        events: SharedEventSink,
        settings: UploadSettings,
    ) -> Self {
        Self {
            transport,
            panel: Arc::new(UploadPanel::new(events.clone())),
            tracker,
            events,
            settings,
        }
    }

    pub fn panel(&self) -> &Arc<UploadPanel> {
        &self.panel
    }

    pub fn tracker(&self) -> &Arc<BatchTracker> {
        &self.tracker
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    /// 上传一批文件，排空后返回。
    ///
    /// `known_names` 是当前照片列表里的文件名。面板的延迟清空在后台进行，
    /// 返回的报告里带着清空任务的句柄。
    pub async fn upload_batch<S: AsRef<str>>(
        &self,
        files: Vec<UploadFile>,
        known_names: &[S],
        refresh: Option<&UnboundedSender<Photo>>,
    ) -> BatchOutcome {
        self.upload_batch_until(files, known_names, refresh, std::future::pending::<()>())
            .await
    }

    /// 同 `upload_batch`，`interrupt` 完成时取消本批次。
    ///
    /// 已开始的文件继续到终止状态，未开始的记为取消。
    pub async fn upload_batch_until<S, F>(
        &self,
        files: Vec<UploadFile>,
        known_names: &[S],
        refresh: Option<&UnboundedSender<Photo>>,
        interrupt: F,
    ) -> BatchOutcome
    where
        S: AsRef<str>,
        F: Future<Output = ()>,
    {
        let intake = partition(files, known_names);
        let skipped = intake.skipped.len();
        self.panel.insert(intake.records().cloned().collect::<Vec<_>>());

        let token = self.tracker.start_batch();
        let batch_id = token.batch_id();
        let jobs: Vec<UploadJob> = intake
            .accepted
            .into_iter()
            .map(|(record, file)| UploadJob {
                record_id: record.id,
                file,
            })
            .collect();

        let mut report = if jobs.is_empty() {
            tracing::info!(batch = batch_id, skipped, "没有需要上传的文件");
            BatchReport {
                batch_id,
                ..Default::default()
            }
        } else {
            let scheduler = UploadScheduler::new(
                self.transport.clone(),
                self.panel.clone(),
                self.events.clone(),
                self.settings.effective_concurrency(),
            );
            let run = scheduler.run(jobs, &token, refresh);
            tokio::pin!(run);
            tokio::pin!(interrupt);
            tokio::select! {
                report = &mut run => report,
                () = &mut interrupt => {
                    tracing::info!(batch = batch_id, "收到中断，取消上传批次");
                    token.cancel();
                    run.await
                }
            }
        };
        report.cancelled = token.is_cancelled();
        report.total += skipped;
        report.skipped += skipped;

        let clear = if self.tracker.complete_batch(batch_id) {
            schedule_clear(
                self.panel.clone(),
                self.tracker.clone(),
                batch_id,
                Duration::from_millis(self.settings.clear_delay_ms),
            )
        } else {
            tracing::debug!(batch = batch_id, "仍有批次在上传，面板由最后完成的批次清空");
            tokio::spawn(async { false })
        };

        BatchOutcome { report, clear }
    }

    /// 取消指定批次，已开始的文件继续到终止状态
    pub fn cancel(&self, batch_id: BatchId) -> bool {
        let cancelled = self.tracker.cancel_batch(batch_id);
        if cancelled {
            tracing::info!(batch = batch_id, "请求取消上传批次");
        }
        cancelled
    }

    pub fn cancel_all(&self) {
        self.tracker.cancel_all();
    }
}

/// 一个批次的结果和它的延迟清空任务
#[derive(Debug)]
pub struct BatchOutcome {
    pub report: BatchReport,
    /// 清空发生时产出 true；清空交给了其他批次时产出 false
    pub clear: JoinHandle<bool>,
}
