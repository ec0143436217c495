//! 待上传文件收集
//!
//! 命令行传入的路径可以是文件或目录，目录递归遍历，只收集图片文件

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use photoshelf_core::{AppError, AppResult, UploadFile};
use walkdir::WalkDir;

/// 服务端能生成缩略图的图片格式
pub const SUPPORTED_FORMATS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "heic", "heif",
];

/// 收集结果
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// 找到的图片文件，按路径排序
    pub files: Vec<PathBuf>,
    /// 遍历的目录数
    pub dirs_scanned: usize,
    /// 跳过的文件数
    pub files_skipped: usize,
}

impl ScanResult {
    /// 转换成待上传文件，读取失败的文件记日志后跳过
    pub fn into_upload_files(self) -> Vec<UploadFile> {
        self.files
            .into_iter()
            .filter_map(|path| match UploadFile::from_path(&path) {
                Ok(file) => Some(file),
                Err(e) => {
                    tracing::warn!("无法读取文件 {:?}: {}", path, e);
                    None
                }
            })
            .collect()
    }
}

/// 快速检查文件是否是支持的图片格式
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            SUPPORTED_FORMATS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}

/// 收集全部路径下的图片文件，同一文件只出现一次
pub fn collect_images(paths: &[PathBuf]) -> AppResult<ScanResult> {
    let mut result = ScanResult::default();
    let mut seen = HashSet::new();

    for path in paths {
        if !path.exists() {
            return Err(AppError::NotFound(format!("路径不存在: {}", path.display())));
        }

        if path.is_file() {
            if is_image_file(path) {
                if seen.insert(path.clone()) {
                    result.files.push(path.clone());
                }
            } else {
                tracing::warn!("不是支持的图片格式，跳过: {}", path.display());
                result.files_skipped += 1;
            }
            continue;
        }

        scan_directory(path, &mut result, &mut seen);
    }

    tracing::info!(
        "扫描完成: {} 个目录, {} 个图片文件, {} 个跳过",
        result.dirs_scanned,
        result.files.len(),
        result.files_skipped
    );
    Ok(result)
}

fn scan_directory(path: &Path, result: &mut ScanResult, seen: &mut HashSet<PathBuf>) {
    let walker = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| include_entry(e, path));

    for entry in walker {
        match entry {
            Ok(entry) => {
                let entry_path = entry.path();
                if entry.file_type().is_dir() {
                    result.dirs_scanned += 1;
                } else if is_image_file(entry_path) {
                    if seen.insert(entry_path.to_path_buf()) {
                        result.files.push(entry_path.to_path_buf());
                    }
                } else {
                    result.files_skipped += 1;
                }
            }
            Err(e) => {
                tracing::warn!("扫描错误: {}", e);
                result.files_skipped += 1;
            }
        }
    }
}

/// 跳过隐藏目录，根目录本身总是包含
fn include_entry(entry: &walkdir::DirEntry, base_path: &Path) -> bool {
    if !entry.file_type().is_dir() || entry.path() == base_path {
        return true;
    }
    !entry.file_name().to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("photo.jpg")));
        assert!(is_image_file(Path::new("photo.JPG")));
        assert!(is_image_file(Path::new("photo.webp")));
        assert!(!is_image_file(Path::new("document.txt")));
        assert!(!is_image_file(Path::new("noext")));
    }

    #[test]
    fn test_collect_directory_and_files() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::write(base.join("b.jpg"), b"fake jpg").unwrap();
        fs::write(base.join("a.png"), b"fake png").unwrap();
        fs::write(base.join("notes.txt"), b"text").unwrap();
        fs::create_dir(base.join("sub")).unwrap();
        fs::write(base.join("sub").join("c.heic"), b"fake heic").unwrap();
        fs::create_dir(base.join(".hidden")).unwrap();
        fs::write(base.join(".hidden").join("d.jpg"), b"fake").unwrap();

        // 目录和其中的文件同时传入，文件只收集一次
        let result = collect_images(&[base.to_path_buf(), base.join("b.jpg")]).unwrap();

        let names: Vec<_> = result
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "b.jpg", "c.heic"]);
        assert_eq!(result.files_skipped, 1);
        assert_eq!(result.dirs_scanned, 2);

        let files = result.into_upload_files();
        assert_eq!(files[1].name, "b.jpg");
        assert_eq!(files[1].size, 8);
    }

    #[test]
    fn test_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        let err = collect_images(&[temp_dir.path().join("nope")]).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
