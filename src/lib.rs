//! photoshelf - 照片上传与排序客户端
//!
//! 核心逻辑在 photoshelf-core，这里提供 HTTP 实现、日志初始化和命令行入口

pub mod api;
pub mod cli;
pub mod commands;
pub mod console;
pub mod logging;
pub mod services;

use std::sync::Arc;

use anyhow::Context;
use photoshelf_core::paths::{AppPaths, PathProvider};
use photoshelf_core::{AppResult, GalleryService, PhotoshelfCore, SettingsManager, UploadService};

use api::HttpPhotoApi;
use cli::{Cli, Command};
use console::ConsoleEventSink;

/// 应用程序状态
pub struct AppState {
    pub core: PhotoshelfCore,
    pub api: Arc<HttpPhotoApi>,
    pub gallery: Arc<GalleryService<HttpPhotoApi>>,
    pub uploads: UploadService<HttpPhotoApi>,
}

impl AppState {
    pub fn new(core: PhotoshelfCore) -> AppResult<Self> {
        let settings = core.settings();
        let api = Arc::new(HttpPhotoApi::new(&settings.api, settings.upload.chunk_size)?);
        let gallery = Arc::new(core.gallery_service(api.clone()));
        let uploads = core.upload_service(api.clone());

        Ok(Self {
            core,
            api,
            gallery,
            uploads,
        })
    }
}

fn apply_cli_overrides(core: &mut PhotoshelfCore, cli: &Cli) {
    let settings = core.settings_mut();
    if let Some(url) = &cli.api {
        settings.api.base_url = url.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        settings.upload.concurrency = concurrency;
    }
}

/// 命令行入口，`args` 包含程序名
pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let mut args = args.into_iter();
    let program = args.next().unwrap_or_else(|| "photoshelf".to_string());

    let cli = match cli::parse_args(args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}\n\n{}", e, cli::usage(&program));
            return Err(e.into());
        }
    };
    if cli.command == Command::Help {
        println!("{}", cli::usage(&program));
        return Ok(());
    }

    let paths = Arc::new(AppPaths::new());
    let manager = SettingsManager::new(&*paths)?;
    let log_level = manager.load_with_env()?.log_level;
    let _guard = logging::init_logging(&log_level, &paths.logs_dir())
        .context("无法初始化日志")?;

    tracing::info!("photoshelf {} 启动", env!("CARGO_PKG_VERSION"));

    if let Command::Settings { reset } = cli.command {
        let settings = if reset {
            commands::reset_settings(&manager)?
        } else {
            commands::get_settings(&manager)?
        };
        println!("{}", serde_json::to_string_pretty(&settings)?);
        println!("# {}", manager.path().display());
        return Ok(());
    }

    let mut core = PhotoshelfCore::new(paths, Arc::new(ConsoleEventSink::new()))?;
    apply_cli_overrides(&mut core, &cli);
    let state = AppState::new(core)?;
    tracing::debug!(api = state.api.base_url(), "使用接口地址");

    match cli.command {
        Command::List => {
            let rows = commands::list_photos(&state).await?;
            for row in &rows {
                println!(
                    "{:>3}  #{:<6} {:<32} {:<32} {}{}",
                    row.index,
                    row.id,
                    row.name,
                    row.title,
                    if row.published { "published" } else { "-" },
                    row.taken.as_deref().map(|t| format!("  {}", t)).unwrap_or_default(),
                );
            }
            println!("{} photos", rows.len());
        }
        Command::Upload { paths } => {
            let report = commands::upload_paths(&state, &paths).await?;
            println!(
                "{} files: {} uploaded, {} skipped, {} failed",
                report.total, report.done, report.skipped, report.failed
            );
        }
        Command::Move { from, to } => {
            let summary = commands::move_photo(&state, from, to).await?;
            println!("{} of {} position updates saved", summary.saved, summary.patched);
        }
        Command::Title { id, text } => {
            if commands::set_title(&state, id, &text).await? {
                println!("title saved");
            } else {
                println!("title unchanged");
            }
        }
        Command::Rename { id, name } => {
            let photo = commands::rename_photo(&state, id, &name).await?;
            println!("renamed #{} to {}", photo.id, photo.name);
        }
        Command::Delete { id } => {
            commands::delete_photo(&state, id).await?;
            println!("deleted #{}", id);
        }
        Command::Settings { .. } | Command::Help => {}
    }

    Ok(())
}
