//! 批注记录 - 业务能力层
//!
//! 自由曲线笔画的采集与锚定：采集时点在活动选区的局部坐标系中，
//! 提交时一次性平移到模板全局坐标，并以提交时刻的游标为键保存。
//! 采集期间只允许追加和撤销最近一条；游标移动前必须先提交或放弃
//! 进行中的笔画（由会话 / 流程层保证，本组件不做约束）。

use crate::models::region::Point;
use crate::services::session::Cursor;
use std::collections::BTreeMap;
use tracing::debug;

/// 一条笔画：模板全局坐标中的有序非空点列
pub type Stroke = Vec<Point>;

/// 批注存储
///
/// 键为 (学生, 大题, 小题) 三元组；BTreeMap 保证持久化时键序确定
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationStore {
    marks: BTreeMap<Cursor, Vec<Stroke>>,
    /// 进行中的笔画，局部坐标
    pending: Vec<Point>,
    /// 相邻采样点的最小间距（像素），抑制笔画体积
    epsilon: f64,
}

impl AnnotationStore {
    pub fn new(epsilon: f64) -> Self {
        Self {
            marks: BTreeMap::new(),
            pending: Vec::new(),
            epsilon,
        }
    }

    /// 从存档恢复已有批注
    pub fn with_marks(epsilon: f64, marks: BTreeMap<Cursor, Vec<Stroke>>) -> Self {
        Self {
            marks,
            pending: Vec::new(),
            epsilon,
        }
    }

    /// 开始一条新笔画（局部坐标）
    ///
    /// 尚未提交的旧笔画被丢弃
    pub fn begin_stroke(&mut self, local: Point) {
        if !self.pending.is_empty() {
            debug!("丢弃未提交的笔画（{} 个点）", self.pending.len());
        }
        self.pending.clear();
        self.pending.push(local);
    }

    /// 向进行中的笔画追加一个采样点（局部坐标）
    ///
    /// 与上一点距离不超过 epsilon 的点被抑制，以控制笔画体积
    /// 而不损失形状。没有进行中的笔画时不做任何事。
    pub fn extend_stroke(&mut self, local: Point) {
        let Some(last) = self.pending.last() else {
            return;
        };
        if last.distance_sq(&local) > self.epsilon * self.epsilon {
            self.pending.push(local);
        }
    }

    /// 提交进行中的笔画
    ///
    /// 每个点加上活动选区原点 `(origin.0, origin.1)` 平移到全局坐标，
    /// 以当前游标为键追加保存，随后清空进行中的笔画。
    /// 返回是否真的提交了（没有进行中的笔画时返回 false）。
    pub fn commit_stroke(&mut self, key: Cursor, origin: (i32, i32)) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        let stroke: Stroke = self
            .pending
            .drain(..)
            .map(|p| p.translated(origin.0, origin.1))
            .collect();
        debug!(
            "提交笔画: 学生 {} 大题 {} 单元 {}，{} 个点",
            key.student,
            key.question,
            key.sub,
            stroke.len()
        );
        self.marks.entry(key).or_default().push(stroke);
        true
    }

    /// 撤销指定键下最近提交的一条笔画
    ///
    /// 没有可撤销的笔画时为无操作，返回 false
    pub fn discard_last_stroke(&mut self, key: Cursor) -> bool {
        match self.marks.get_mut(&key) {
            Some(strokes) if !strokes.is_empty() => {
                strokes.pop();
                if strokes.is_empty() {
                    self.marks.remove(&key);
                }
                true
            }
            _ => false,
        }
    }

    /// 是否存在未提交的笔画
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// 放弃进行中的笔画
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    pub fn strokes_for(&self, key: Cursor) -> &[Stroke] {
        self.marks.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn marks(&self) -> &BTreeMap<Cursor, Vec<Stroke>> {
        &self.marks
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty() && self.pending.is_empty()
    }
}
