//! 照片顺序模型
//!
//! 内存中的有序照片列表。拖拽时先乐观地移动，松手后 `commit` 只为
//! 位置变化的照片生成补丁，并立即把它们的 sort_order 改成新位置。

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{Photo, PhotoId, PhotoUpdate};

/// 一条位置补丁：PATCH /photos/{id} {"sort_order": ..}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPatch {
    pub id: PhotoId,
    pub sort_order: i32,
}

impl PositionPatch {
    pub fn to_update(&self) -> PhotoUpdate {
        PhotoUpdate::sort_order(self.sort_order)
    }
}

/// 一条标题补丁
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitlePatch {
    pub id: PhotoId,
    pub title: String,
}

impl TitlePatch {
    pub fn to_update(&self) -> PhotoUpdate {
        PhotoUpdate::title(self.title.clone())
    }
}

/// 服务端列表的排序：sort_order 升序，相同时新照片在前
fn server_cmp(a: &Photo, b: &Photo) -> Ordering {
    a.sort_order.cmp(&b.sort_order).then(b.id.cmp(&a.id))
}

fn server_order(photos: &mut [Photo]) {
    photos.sort_by(server_cmp);
}

/// 有序照片列表
#[derive(Debug, Clone, Default)]
pub struct OrderModel {
    photos: Vec<Photo>,
    /// 正在编辑、尚未提交的标题
    drafts: HashMap<PhotoId, String>,
}

impl OrderModel {
    /// 按服务端排序建立模型，重复 ID 只保留第一个
    pub fn new(photos: Vec<Photo>) -> Self {
        let mut seen = HashSet::new();
        let mut photos: Vec<Photo> = photos.into_iter().filter(|p| seen.insert(p.id)).collect();
        server_order(&mut photos);
        Self {
            photos,
            drafts: HashMap::new(),
        }
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn ids(&self) -> Vec<PhotoId> {
        self.photos.iter().map(|p| p.id).collect()
    }

    pub fn index_of(&self, id: PhotoId) -> Option<usize> {
        self.photos.iter().position(|p| p.id == id)
    }

    pub fn get(&self, id: PhotoId) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == id)
    }

    /// 上传查重用的文件名集合
    pub fn known_names(&self) -> Vec<String> {
        self.photos.iter().map(|p| p.name.clone()).collect()
    }

    /// 把 `from` 位置的照片移到 `to`。相同位置或越界时什么也不做，返回 false
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        let len = self.photos.len();
        if from == to || from >= len || to >= len {
            return false;
        }
        let photo = self.photos.remove(from);
        self.photos.insert(to, photo);
        true
    }

    /// 对比当前位置和 sort_order，为不一致的照片生成补丁并乐观更新
    pub fn commit(&mut self) -> Vec<PositionPatch> {
        let mut patches = Vec::new();
        for (index, photo) in self.photos.iter_mut().enumerate() {
            let index = index as i32;
            if photo.sort_order != index {
                photo.sort_order = index;
                patches.push(PositionPatch {
                    id: photo.id,
                    sort_order: index,
                });
            }
        }
        tracing::debug!(patches = patches.len(), "提交排序");
        patches
    }

    /// 恢复到之前记下的顺序。`ids` 必须是当前集合的一个排列
    pub fn restore(&mut self, ids: &[PhotoId]) -> bool {
        if ids.len() != self.photos.len() {
            return false;
        }
        let mut by_id: HashMap<PhotoId, Photo> =
            self.photos.iter().map(|p| (p.id, p.clone())).collect();
        let mut restored = Vec::with_capacity(ids.len());
        for id in ids {
            match by_id.remove(id) {
                Some(photo) => restored.push(photo),
                None => return false,
            }
        }
        self.photos = restored;
        true
    }

    /// 用新的服务端列表替换，保留仍存在照片的标题草稿
    pub fn reconcile(&mut self, server_photos: Vec<Photo>) {
        let drafts = std::mem::take(&mut self.drafts);
        *self = Self::new(server_photos);
        self.drafts = drafts
            .into_iter()
            .filter(|(id, _)| self.get(*id).is_some())
            .collect();
    }

    /// 采用服务端返回的字段，但不改变位置和本地 sort_order
    pub fn merge_server_photo(&mut self, photo: Photo) -> bool {
        match self.photos.iter_mut().find(|p| p.id == photo.id) {
            Some(existing) => {
                let sort_order = existing.sort_order;
                *existing = photo;
                existing.sort_order = sort_order;
                true
            }
            None => false,
        }
    }

    /// 加入一张新上传的照片，位置与服务端列表一致（已存在时按 merge 处理）
    pub fn insert_uploaded(&mut self, photo: Photo) {
        if self.get(photo.id).is_some() {
            self.merge_server_photo(photo);
        } else {
            let index = self
                .photos
                .partition_point(|p| server_cmp(p, &photo) == Ordering::Less);
            self.photos.insert(index, photo);
        }
    }

    pub fn remove(&mut self, id: PhotoId) -> Option<Photo> {
        let index = self.index_of(id)?;
        self.drafts.remove(&id);
        Some(self.photos.remove(index))
    }

    /// 显示用的标题：有草稿时显示草稿
    pub fn title_for(&self, id: PhotoId) -> Option<&str> {
        if let Some(draft) = self.drafts.get(&id) {
            return Some(draft.as_str());
        }
        self.get(id).and_then(|p| p.title.as_deref())
    }

    pub fn has_draft(&self, id: PhotoId) -> bool {
        self.drafts.contains_key(&id)
    }

    pub fn set_title_draft(&mut self, id: PhotoId, text: impl Into<String>) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.drafts.insert(id, text.into());
        true
    }

    pub fn discard_title_draft(&mut self, id: PhotoId) -> bool {
        self.drafts.remove(&id).is_some()
    }

    /// 结束编辑。草稿与已知标题不同时乐观采用并返回补丁
    ///
    /// 没有标题的照片视为标题为空字符串。
    pub fn commit_title(&mut self, id: PhotoId) -> Option<TitlePatch> {
        let draft = self.drafts.remove(&id)?;
        let photo = self.photos.iter_mut().find(|p| p.id == id)?;
        if photo.title.as_deref().unwrap_or("") == draft {
            return None;
        }
        photo.title = Some(draft.clone());
        Some(TitlePatch { id, title: draft })
    }
}
