//! Path provider abstraction.
//!
//! Resolves where settings and log files live, so tests and embedders can
//! point the core at their own directories.

use std::path::PathBuf;
use std::sync::Arc;

/// Trait for providing application data paths.
pub trait PathProvider: Send + Sync {
    /// Get the root application directory.
    fn app_dir(&self) -> PathBuf;

    /// Get the settings file path.
    fn settings_path(&self) -> PathBuf {
        self.app_dir().join("settings.json")
    }

    /// Get the logs directory.
    fn logs_dir(&self) -> PathBuf {
        self.app_dir().join("logs")
    }
}

/// Shared reference to a PathProvider implementation.
pub type SharedPathProvider = Arc<dyn PathProvider>;

/// Default path provider using the platform config directory
/// (`~/.config/photoshelf`, `%APPDATA%\photoshelf`, ...).
#[derive(Debug, Clone)]
pub struct AppPaths {
    app_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let app_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photoshelf");
        Self { app_dir }
    }

    /// Create an AppPaths rooted at a custom directory.
    ///
    /// Useful for testing.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { app_dir: base_dir }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

impl PathProvider for AppPaths {
    fn app_dir(&self) -> PathBuf {
        self.app_dir.clone()
    }
}
