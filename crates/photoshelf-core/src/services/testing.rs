//! 测试用的接口替身

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::{Photo, PhotoId, PhotoUpdate, UploadFile};
use crate::services::api::{PhotoApi, TransportError, UploadTransport};
use crate::services::upload_worker::ProgressReporter;
use crate::utils::error::{AppError, AppResult};

/// 一组 sort_order 连续的照片，名字为 p0.jpg, p1.jpg ...
pub fn photos(n: usize) -> Vec<Photo> {
    (0..n)
        .map(|i| Photo::new(i as PhotoId + 1, format!("p{}.jpg", i), format!("https://cdn.test/full/p{}.jpg", i), i as i32))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOutcome {
    Created,
    Status(u16),
    Network,
}

/// 可编排结果和耗时的上传传输层
pub struct FakeTransport {
    outcomes: Mutex<HashMap<String, FakeOutcome>>,
    delays: Mutex<HashMap<String, Duration>>,
    panics: Mutex<HashSet<String>>,
    default_delay: Duration,
    next_id: AtomicI64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    log: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
            panics: Mutex::new(HashSet::new()),
            default_delay: Duration::from_millis(100),
            next_id: AtomicI64::new(100),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_outcome(&self, name: &str, outcome: FakeOutcome) {
        self.outcomes.lock().insert(name.to_string(), outcome);
    }

    pub fn set_delay(&self, name: &str, delay: Duration) {
        self.delays.lock().insert(name.to_string(), delay);
    }

    pub fn panic_on(&self, name: &str) {
        self.panics.lock().insert(name.to_string());
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// "start:<name>" / "end:<name>" 按发生顺序
    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl UploadTransport for FakeTransport {
    async fn upload(
        &self,
        file: UploadFile,
        reporter: ProgressReporter,
    ) -> Result<Photo, TransportError> {
        self.calls.lock().push(file.name.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.log.lock().push(format!("start:{}", file.name));

        let should_panic = self.panics.lock().contains(&file.name);
        if should_panic {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            panic!("transport exploded for {}", file.name);
        }

        let delay = self
            .delays
            .lock()
            .get(&file.name)
            .copied()
            .unwrap_or(self.default_delay);
        let outcome = self
            .outcomes
            .lock()
            .get(&file.name)
            .copied()
            .unwrap_or(FakeOutcome::Created);

        let total = file.size.max(1);
        reporter.progress(total / 2, total);
        tokio::time::sleep(delay / 2).await;
        if outcome != FakeOutcome::Network {
            reporter.progress(total, total);
            reporter.sent();
        }
        tokio::time::sleep(delay / 2).await;

        self.log.lock().push(format!("end:{}", file.name));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match outcome {
            FakeOutcome::Created => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                Ok(Photo::new(id, file.name.clone(), format!("https://cdn.test/full/{}", file.name), 0))
            }
            FakeOutcome::Status(status) => Err(TransportError::Status(status)),
            FakeOutcome::Network => Err(TransportError::Network("connection reset".into())),
        }
    }
}

/// 内存中的照片接口
pub struct FakeApi {
    photos: Mutex<Vec<Photo>>,
    patches: Mutex<Vec<(PhotoId, PhotoUpdate)>>,
    deletes: Mutex<Vec<PhotoId>>,
    failing: Mutex<HashSet<PhotoId>>,
}

impl FakeApi {
    pub fn new(photos: Vec<Photo>) -> Self {
        Self {
            photos: Mutex::new(photos),
            patches: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// 之后对该照片的 PATCH 都返回 500
    pub fn fail_updates_for(&self, id: PhotoId) {
        self.failing.lock().insert(id);
    }

    pub fn patches(&self) -> Vec<(PhotoId, PhotoUpdate)> {
        self.patches.lock().clone()
    }

    pub fn deletes(&self) -> Vec<PhotoId> {
        self.deletes.lock().clone()
    }

    pub fn push_photo(&self, photo: Photo) {
        self.photos.lock().push(photo);
    }

    pub fn server_photo(&self, id: PhotoId) -> Option<Photo> {
        self.photos.lock().iter().find(|p| p.id == id).cloned()
    }
}

impl PhotoApi for FakeApi {
    async fn list_photos(&self) -> AppResult<Vec<Photo>> {
        Ok(self.photos.lock().clone())
    }

    async fn update_photo(&self, id: PhotoId, update: &PhotoUpdate) -> AppResult<Photo> {
        self.patches.lock().push((id, update.clone()));
        if self.failing.lock().contains(&id) {
            return Err(AppError::Http {
                status: 500,
                message: "internal error".into(),
            });
        }

        let mut photos = self.photos.lock();
        let photo = photos
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::Http {
                status: 404,
                message: "Photo not found".into(),
            })?;
        if let Some(title) = &update.title {
            photo.title = Some(title.clone());
        }
        if let Some(name) = &update.name {
            photo.name = name.clone();
        }
        if let Some(sort_order) = update.sort_order {
            photo.sort_order = sort_order;
        }
        Ok(photo.clone())
    }

    async fn delete_photo(&self, id: PhotoId) -> AppResult<()> {
        self.deletes.lock().push(id);
        let mut photos = self.photos.lock();
        let before = photos.len();
        photos.retain(|p| p.id != id);
        if photos.len() == before {
            return Err(AppError::Http {
                status: 404,
                message: "Photo not found".into(),
            });
        }
        Ok(())
    }
}
