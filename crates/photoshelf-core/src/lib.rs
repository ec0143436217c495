//! photoshelf Core Library
//!
//! This crate provides the client-side logic of photoshelf: uploading batches
//! of photos with bounded concurrency and reordering the photo list by drag and
//! drop. It is frontend-agnostic and talks to the photo server only through the
//! [`PhotoApi`] and [`UploadTransport`] traits.
//!
//! # Architecture
//!
//! - `models`: Data structures (Photo, UploadRecord, UploadFile, Settings)
//! - `services`: Upload intake, scheduler, worker state machine and panel;
//!   order model, drag controller and the gallery controller
//! - `events`: Event emission abstraction (EventSink trait)
//! - `paths`: Path provider abstraction (PathProvider trait)
//! - `jobs`: Upload batch tracking and cancellation
//! - `utils`: Error handling
//!
//! # Example
//!
//! ```no_run
//! use photoshelf_core::{PhotoshelfCore, paths::AppPaths, events::LoggingEventSink};
//! use std::sync::Arc;
//!
//! let core = PhotoshelfCore::new(Arc::new(AppPaths::new()), Arc::new(LoggingEventSink)).unwrap();
//! println!("uploading {} files at a time", core.settings().upload.effective_concurrency());
//! ```

pub mod events;
pub mod jobs;
pub mod models;
pub mod paths;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use events::{EventSink, LoggingEventSink, NoOpEventSink, RecordingEventSink, SharedEventSink};
pub use jobs::{BatchId, BatchTracker, CancelToken};
pub use models::{AppSettings, Photo, PhotoId, PhotoUpdate, UploadFile, UploadRecord, UploadStatus};
pub use paths::{AppPaths, PathProvider, SharedPathProvider};
pub use services::{
    BatchOutcome, BatchReport, DropOutcome, GalleryService, OrderModel, PhotoApi,
    SettingsManager, TransportError, UploadPanel, UploadService, UploadTransport,
};
pub use utils::{AppError, AppResult, CommandError};

use std::sync::Arc;

/// photoshelf core application context.
///
/// Holds the shared resources and builds the two controllers.
pub struct PhotoshelfCore {
    /// Path provider for resolving application paths
    pub path_provider: SharedPathProvider,
    /// Event sink for emitting events to the frontend
    pub event_sink: SharedEventSink,
    /// Registry of running upload batches
    pub batch_tracker: Arc<BatchTracker>,
    settings_manager: SettingsManager,
    settings: AppSettings,
}

impl PhotoshelfCore {
    /// Create a new context, loading settings (with environment overrides).
    pub fn new(path_provider: SharedPathProvider, event_sink: SharedEventSink) -> AppResult<Self> {
        let settings_manager = SettingsManager::new(&*path_provider)?;
        let settings = settings_manager.load_with_env()?;

        Ok(Self {
            path_provider,
            event_sink,
            batch_tracker: Arc::new(BatchTracker::new()),
            settings_manager,
            settings,
        })
    }

    pub fn paths(&self) -> &SharedPathProvider {
        &self.path_provider
    }

    pub fn events(&self) -> &SharedEventSink {
        &self.event_sink
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Mutable settings for per-run overrides (not persisted).
    pub fn settings_mut(&mut self) -> &mut AppSettings {
        &mut self.settings
    }

    pub fn settings_manager(&self) -> &SettingsManager {
        &self.settings_manager
    }

    /// Build the upload controller on top of a transport.
    pub fn upload_service<T: UploadTransport>(&self, transport: Arc<T>) -> UploadService<T> {
        UploadService::new(
            transport,
            self.batch_tracker.clone(),
            self.event_sink.clone(),
            self.settings.upload.clone(),
        )
    }

    /// Build the gallery controller on top of the photo API.
    pub fn gallery_service<A: PhotoApi>(&self, api: Arc<A>) -> GalleryService<A> {
        GalleryService::new(api, self.event_sink.clone(), &self.settings.reorder)
    }
}
