//! 命令行参数解析

use std::path::PathBuf;

use photoshelf_core::{AppError, AppResult, PhotoId};

/// 子命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Upload { paths: Vec<PathBuf> },
    Move { from: usize, to: usize },
    Title { id: PhotoId, text: String },
    Rename { id: PhotoId, name: String },
    Delete { id: PhotoId },
    Settings { reset: bool },
    Help,
}

/// 解析后的命令行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    /// 覆盖设置里的接口地址
    pub api: Option<String>,
    /// 覆盖设置里的上传并发数
    pub concurrency: Option<usize>,
    pub command: Command,
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage:\n  {program} [--api <url>] [--concurrency <n>] <command>\n\nCommands:\n  list                     list photos in display order\n  upload <path>...         upload image files or directories\n  move <from> <to>         move the photo at index <from> to <to> and save the order\n  title <id> <text>        set a photo title\n  rename <id> <name>       rename a photo file\n  delete <id>              delete a photo\n  settings [reset]         print or reset settings\n\nFlags:\n  --api <url>              photo server base URL (default from settings)\n  --concurrency <n>        uploads in flight at once (default 3)\n  -h, --help               show this help"
    )
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::InvalidInput(message.into())
}

fn parse_number<T: std::str::FromStr>(value: Option<String>, what: &str) -> AppResult<T> {
    let value = value.ok_or_else(|| invalid(format!("缺少参数 {}", what)))?;
    value
        .parse()
        .map_err(|_| invalid(format!("{} 不是有效的数字: {}", what, value)))
}

/// 解析参数（不含程序名）
pub fn parse_args<I>(args: I) -> AppResult<Cli>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut api = None;
    let mut concurrency = None;
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--api" => {
                api = Some(args.next().ok_or_else(|| invalid("--api 需要一个地址"))?);
            }
            "--concurrency" => {
                concurrency = Some(parse_number(args.next(), "--concurrency")?);
            }
            "-h" | "--help" => {
                return Ok(Cli {
                    api,
                    concurrency,
                    command: Command::Help,
                });
            }
            flag if flag.starts_with("--") && positional.is_empty() => {
                return Err(invalid(format!("未知选项: {}", flag)));
            }
            _ => positional.push(arg),
        }
    }

    let mut rest = positional.into_iter();
    let command = match rest.next().as_deref() {
        None | Some("help") => Command::Help,
        Some("list") => Command::List,
        Some("upload") => {
            let paths: Vec<PathBuf> = rest.by_ref().map(PathBuf::from).collect();
            if paths.is_empty() {
                return Err(invalid("upload 需要至少一个路径"));
            }
            Command::Upload { paths }
        }
        Some("move") => Command::Move {
            from: parse_number(rest.next(), "<from>")?,
            to: parse_number(rest.next(), "<to>")?,
        },
        Some("title") => {
            let id = parse_number(rest.next(), "<id>")?;
            let text = rest.by_ref().collect::<Vec<_>>().join(" ");
            Command::Title { id, text }
        }
        Some("rename") => Command::Rename {
            id: parse_number(rest.next(), "<id>")?,
            name: rest.next().ok_or_else(|| invalid("缺少参数 <name>"))?,
        },
        Some("delete") => Command::Delete {
            id: parse_number(rest.next(), "<id>")?,
        },
        Some("settings") => match rest.next().as_deref() {
            None => Command::Settings { reset: false },
            Some("reset") => Command::Settings { reset: true },
            Some(other) => return Err(invalid(format!("未知的 settings 子命令: {}", other))),
        },
        Some(other) => return Err(invalid(format!("未知命令: {}", other))),
    };

    if let Some(extra) = rest.next() {
        return Err(invalid(format!("多余的参数: {}", extra)));
    }

    Ok(Cli {
        api,
        concurrency,
        command,
    })
}
