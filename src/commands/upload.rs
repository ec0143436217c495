//! 上传命令

use std::path::PathBuf;

use photoshelf_core::{AppError, BatchReport, CommandError};

use crate::services::collect_images;
use crate::AppState;

/// 上传文件或目录下的全部图片，等待批次排空
pub async fn upload_paths(state: &AppState, paths: &[PathBuf]) -> Result<BatchReport, CommandError> {
    let files = collect_images(paths)?.into_upload_files();
    if files.is_empty() {
        tracing::info!("没有找到可上传的图片");
        return Ok(BatchReport::default());
    }

    state.gallery.refresh().await?;
    let known_names = state.gallery.known_names();

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let listener = state.gallery.spawn_refresh_listener(rx);

    let outcome = state
        .uploads
        .upload_batch_until(files, &known_names, Some(&tx), interrupted())
        .await;
    drop(tx);

    match listener.await {
        Ok(added) => tracing::debug!(added, "照片列表已更新"),
        Err(e) => tracing::warn!("刷新任务异常退出: {}", e),
    }
    // 进程马上退出，面板不需要延迟清空
    outcome.clear.abort();

    let report = outcome.report;
    if report.cancelled {
        tracing::warn!(
            done = report.done,
            skipped = report.skipped,
            failed = report.failed,
            "上传已中断"
        );
        return Err(AppError::Cancelled.into());
    }
    Ok(report)
}

/// Ctrl-C。无法监听信号时永不完成
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("无法监听中断信号: {}", e);
        std::future::pending::<()>().await;
    }
}
