//! 题目层级划分
//!
//! 按照操作员确认矩形的时间顺序，把每个新选区归类为：
//! 1. 合并标记置位 → 追加为最后一个大题的跨页段
//! 2. 被某个已有大题自身的段包含 → 成为该大题的新小题
//! 3. 尚无任何大题 → 创建大题 1
//! 4. 其他情况 → 创建新大题
//!
//! 包含判断按创建顺序的倒序扫描（越晚画的越可能归属刚画的大题）。
//! 被多个大题包含的选区归于倒序扫描的第一个命中，这是约定的
//! 决胜规则而非错误。

use crate::error::{AppError, AppResult, InputError};
use crate::models::question::{Question, SubQuestion};
use crate::models::region::Region;
use tracing::debug;

/// 单次分类的归类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// 合并进指定大题的跨页段
    MergedInto { question_id: usize },
    /// 成为指定大题的新小题
    SubQuestion { question_id: usize, sub_index: usize },
    /// 创建了新大题
    NewQuestion { question_id: usize },
}

/// 大题层级
///
/// 划分阶段构建一次，批改阶段只读
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionHierarchy {
    questions: Vec<Question>,
}

impl RegionHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从已加载的大题列表重建（用于读取配置文件）
    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// 全部大题中最大的计分单元数（至少为 1）
    pub fn max_scoring_units(&self) -> usize {
        self.questions
            .iter()
            .map(Question::scoring_units)
            .max()
            .unwrap_or(1)
    }

    /// 归类一个新确认的选区
    ///
    /// `merge_flag` 置位时把选区并入最后一个大题的段（用于大题跨页），
    /// 调用方在本次归类后应清除自己的合并标记。
    /// 退化选区在进入扫描前即被拒绝。
    pub fn classify(&mut self, region: Region, merge_flag: bool) -> AppResult<Placement> {
        if region.is_degenerate() {
            return Err(AppError::Input(InputError::DegenerateRegion {
                w: region.w,
                h: region.h,
            }));
        }

        if merge_flag {
            if let Some(last) = self.questions.last_mut() {
                last.segments.push(region);
                debug!("选区 {} 合并进大题#{}", region, last.id);
                return Ok(Placement::MergedInto { question_id: last.id });
            }
        }

        // 倒序扫描：新画的选区更可能属于刚画的大题
        for question in self.questions.iter_mut().rev() {
            if question.contains(&region) {
                let sub_index = question.subs.len() + 1;
                question.subs.push(SubQuestion::new(sub_index, region));
                debug!("选区 {} 归为小题 {}.{}", region, question.id, sub_index);
                return Ok(Placement::SubQuestion {
                    question_id: question.id,
                    sub_index,
                });
            }
        }

        let id = self.questions.last().map_or(1, |q| q.id + 1);
        self.questions.push(Question::new(id, region));
        debug!("选区 {} 创建为大题#{}", region, id);
        Ok(Placement::NewQuestion { question_id: id })
    }
}
