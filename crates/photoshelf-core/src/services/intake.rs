//! 文件接收与查重
//!
//! 按输入顺序把候选文件分成“跳过”和“待上传”两组：
//! 名字已存在（包括同一批里先出现的同名文件）的直接生成 skipped 记录，不发请求。

use std::collections::HashSet;

use crate::models::{UploadFile, UploadRecord};

/// 查重结果
#[derive(Debug, Default)]
pub struct IntakeResult {
    /// 已生成终止记录的重名文件
    pub skipped: Vec<UploadRecord>,
    /// 待上传文件及其 uploading 记录，顺序与输入一致
    pub accepted: Vec<(UploadRecord, UploadFile)>,
}

impl IntakeResult {
    /// 待上传文件（不含记录）
    pub fn to_upload(&self) -> Vec<&UploadFile> {
        self.accepted.iter().map(|(_, file)| file).collect()
    }

    /// 本批全部记录：先是跳过的，再是待上传的
    pub fn records(&self) -> impl Iterator<Item = &UploadRecord> {
        self.skipped.iter().chain(self.accepted.iter().map(|(record, _)| record))
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// 对候选文件做名字查重
pub fn partition<S: AsRef<str>>(files: Vec<UploadFile>, known_names: &[S]) -> IntakeResult {
    let mut seen: HashSet<String> = known_names.iter().map(|n| n.as_ref().to_string()).collect();
    let mut result = IntakeResult::default();

    for file in files {
        if seen.contains(&file.name) {
            tracing::debug!(name = %file.name, "文件名已存在，跳过");
            result.skipped.push(UploadRecord::skipped(file.name.clone()));
            continue;
        }
        seen.insert(file.name.clone());
        result.accepted.push((UploadRecord::uploading(file.name.clone()), file));
    }

    tracing::debug!(
        skipped = result.skipped.len(),
        accepted = result.accepted.len(),
        "文件查重完成"
    );
    result
}
