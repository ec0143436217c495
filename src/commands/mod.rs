//! photoshelf 命令模块
//!
//! 每个命令返回 `Result<T, CommandError>`，由入口负责打印

pub mod photos;
pub mod reorder;
pub mod settings;
pub mod upload;

pub use photos::*;
pub use reorder::*;
pub use settings::*;
pub use upload::*;
