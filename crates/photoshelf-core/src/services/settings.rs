//! 应用程序设置服务
//!
//! 负责设置的读取、保存、重置以及环境变量覆盖

use std::fs;
use std::path::PathBuf;

use crate::models::AppSettings;
use crate::paths::PathProvider;
use crate::utils::error::AppError;

/// 覆盖接口地址的环境变量
pub const ENV_API_URL: &str = "PHOTOSHELF_API_URL";
/// 覆盖日志级别的环境变量
pub const ENV_LOG_LEVEL: &str = "PHOTOSHELF_LOG_LEVEL";

/// 设置管理器
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// 使用 PathProvider 创建设置管理器
    pub fn new(provider: &dyn PathProvider) -> Result<Self, AppError> {
        Self::from_path(provider.settings_path())
    }

    /// 从指定路径创建设置管理器
    pub fn from_path(settings_path: PathBuf) -> Result<Self, AppError> {
        // 确保父目录存在
        if let Some(parent) = settings_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("无法创建配置目录: {}", e)))?;
        }

        Ok(Self { settings_path })
    }

    /// 加载设置，文件不存在时返回默认值
    pub fn load(&self) -> Result<AppSettings, AppError> {
        if !self.settings_path.exists() {
            tracing::info!("设置文件不存在，使用默认设置");
            return Ok(AppSettings::default());
        }

        let content = fs::read_to_string(&self.settings_path)
            .map_err(|e| AppError::Config(format!("无法读取设置文件: {}", e)))?;

        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("设置文件格式错误: {}", e)))?;

        tracing::info!("成功加载设置: {:?}", self.settings_path);
        Ok(settings)
    }

    /// 加载设置并应用环境变量覆盖
    pub fn load_with_env(&self) -> Result<AppSettings, AppError> {
        let mut settings = self.load()?;
        apply_overrides(&mut settings, |key| std::env::var(key).ok());
        Ok(settings)
    }

    /// 保存设置
    pub fn save(&self, settings: &AppSettings) -> Result<(), AppError> {
        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Config(format!("无法序列化设置: {}", e)))?;

        fs::write(&self.settings_path, content)
            .map_err(|e| AppError::Config(format!("无法保存设置文件: {}", e)))?;

        tracing::info!("成功保存设置: {:?}", self.settings_path);
        Ok(())
    }

    /// 重置为默认设置
    pub fn reset(&self) -> Result<AppSettings, AppError> {
        let default_settings = AppSettings::default();
        self.save(&default_settings)?;
        Ok(default_settings)
    }

    /// 获取设置文件路径
    pub fn path(&self) -> &PathBuf {
        &self.settings_path
    }
}

/// 用外部变量覆盖设置，空值忽略
pub fn apply_overrides<F>(settings: &mut AppSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
        settings.api.base_url = url.trim().to_string();
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
        settings.log_level = level.trim().to_lowercase();
    }
}
