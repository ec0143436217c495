//! 拖拽排序手势
//!
//! 纯几何计算，不做任何 I/O。指针移动超过激活距离才进入拖拽，
//! 悬停目标按“中心点最近”判定，松手时给出 [`DropOutcome`]。

use serde::{Deserialize, Serialize};

use crate::models::{PhotoId, ReorderSettings};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// 可放置区域：列表中第 `index` 项的矩形
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropZone {
    pub index: usize,
    pub rect: Rect,
}

/// 中心点距离最近的区域，距离相同取先出现的
pub fn closest_center(active: &Rect, zones: &[DropZone]) -> Option<usize> {
    let center = active.center();
    let mut best: Option<(usize, f64)> = None;
    for zone in zones {
        let distance = center.distance_to(zone.rect.center());
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((zone.index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

/// 松手结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DropOutcome {
    /// 未达到激活距离就松手
    Click { index: usize },
    /// 没有目标或目标就是自己
    NoOp,
    Move { from: usize, to: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    /// 按下但还未超过激活距离
    Pending { index: usize, origin: Point, rect: Rect },
    Dragging {
        index: usize,
        origin: Point,
        rect: Rect,
        over: Option<usize>,
    },
}

/// 拖拽手势状态机
#[derive(Debug, Clone)]
pub struct DragController {
    activation_distance: f64,
    zones: Vec<DropZone>,
    state: DragState,
}

impl DragController {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            activation_distance: activation_distance.max(0.0),
            zones: Vec::new(),
            state: DragState::Idle,
        }
    }

    pub fn from_settings(settings: &ReorderSettings) -> Self {
        Self::new(settings.activation_distance)
    }

    pub fn activation_distance(&self) -> f64 {
        self.activation_distance
    }

    /// 更新布局（每项的矩形）
    pub fn set_zones(&mut self, zones: Vec<DropZone>) {
        self.zones = zones;
    }

    pub fn zones(&self) -> &[DropZone] {
        &self.zones
    }

    /// 在第 `index` 项上按下指针。
    ///
    /// 该项不在当前布局里时忽略这次按下并返回 false
    pub fn pointer_down(&mut self, index: usize, at: Point) -> bool {
        let Some(rect) = self.zones.iter().find(|z| z.index == index).map(|z| z.rect) else {
            tracing::debug!(index, "按下的项没有布局矩形，忽略");
            self.state = DragState::Idle;
            return false;
        };
        self.state = DragState::Pending {
            index,
            origin: at,
            rect,
        };
        true
    }

    /// 指针移动，返回当前悬停目标
    pub fn pointer_move(&mut self, at: Point) -> Option<usize> {
        match self.state {
            DragState::Idle => None,
            DragState::Pending { index, origin, rect } => {
                if origin.distance_to(at) > self.activation_distance {
                    tracing::debug!(index, "开始拖拽");
                    let over = self.resolve(origin, rect, at);
                    self.state = DragState::Dragging {
                        index,
                        origin,
                        rect,
                        over,
                    };
                    over
                } else {
                    None
                }
            }
            DragState::Dragging {
                index, origin, rect, ..
            } => {
                let over = self.resolve(origin, rect, at);
                self.state = DragState::Dragging {
                    index,
                    origin,
                    rect,
                    over,
                };
                over
            }
        }
    }

    /// 松开指针
    pub fn pointer_up(&mut self, at: Point) -> DropOutcome {
        if let DragState::Pending { .. } | DragState::Dragging { .. } = self.state {
            self.pointer_move(at);
        }
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        match state {
            DragState::Idle => DropOutcome::NoOp,
            DragState::Pending { index, .. } => DropOutcome::Click { index },
            DragState::Dragging { index, over, .. } => match over {
                Some(to) if to != index => DropOutcome::Move { from: index, to },
                _ => DropOutcome::NoOp,
            },
        }
    }

    /// 指针离开视口或按下 Escape。返回之前是否处于拖拽中
    pub fn cancel(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn is_pressed(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    pub fn active_index(&self) -> Option<usize> {
        match self.state {
            DragState::Dragging { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn over_index(&self) -> Option<usize> {
        match self.state {
            DragState::Dragging { over, .. } => over,
            _ => None,
        }
    }

    /// 按当前悬停目标预览的顺序，不修改模型
    pub fn projected_order(&self, ids: &[PhotoId]) -> Vec<PhotoId> {
        let mut order = ids.to_vec();
        if let (Some(from), Some(to)) = (self.active_index(), self.over_index()) {
            if from != to && from < order.len() && to < order.len() {
                let id = order.remove(from);
                order.insert(to, id);
            }
        }
        order
    }

    fn resolve(&self, origin: Point, rect: Rect, at: Point) -> Option<usize> {
        let moved = rect.translate(at.x - origin.x, at.y - origin.y);
        closest_center(&moved, &self.zones)
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::from_settings(&ReorderSettings::default())
    }
}

/// 单行等宽布局，测试和命令行使用
pub fn row_layout(count: usize, width: f64, height: f64, gap: f64) -> Vec<DropZone> {
    (0..count)
        .map(|index| DropZone {
            index,
            rect: Rect::new(index as f64 * (width + gap), 0.0, width, height),
        })
        .collect()
}
