//! 设置命令

use photoshelf_core::{AppSettings, CommandError, SettingsManager};

/// 获取应用程序设置（含环境变量覆盖）
pub fn get_settings(manager: &SettingsManager) -> Result<AppSettings, CommandError> {
    let settings = manager.load_with_env().map_err(CommandError::from)?;
    Ok(settings)
}

/// 重置设置为默认值
pub fn reset_settings(manager: &SettingsManager) -> Result<AppSettings, CommandError> {
    let settings = manager.reset().map_err(CommandError::from)?;
    tracing::info!("设置已重置: {:?}", manager.path());
    Ok(settings)
}
