//! 命令行的事件输出

use photoshelf_core::events::names;
use photoshelf_core::EventSink;
use serde_json::Value;

/// 把上传状态变化打印成一行一条的状态文字
#[derive(Debug, Default)]
pub struct ConsoleEventSink;

impl ConsoleEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// 把一条上传记录格式化成状态行，进度变化不输出
pub fn status_line(record: &Value) -> Option<String> {
    let name = record.get("name")?.as_str()?;
    let line = match record.get("status")?.as_str()? {
        "uploading" => return None,
        "processing" => format!("  {:<40} processing…", name),
        "done" => format!("  {:<40} done", name),
        "skipped" => format!("  {:<40} skipped", name),
        "error" => {
            let error = record.get("error").and_then(Value::as_str).unwrap_or("error");
            format!("  {:<40} {}", name, error)
        }
        _ => return None,
    };
    Some(line)
}

impl EventSink for ConsoleEventSink {
    fn emit(&self, event_name: &str, payload_json: &str) {
        tracing::trace!(event = event_name, payload = payload_json, "Event emitted");
        if event_name != names::UPLOAD_PROGRESS {
            return;
        }
        match serde_json::from_str::<Value>(payload_json) {
            Ok(record) => {
                if let Some(line) = status_line(&record) {
                    println!("{}", line);
                }
            }
            Err(e) => tracing::error!("无法解析事件内容: {}", e),
        }
    }
}
