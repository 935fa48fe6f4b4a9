//! 批改上下文
//!
//! 封装"我正在批哪个学生的哪道题"这一信息，仅用于展示和日志

use crate::models::hierarchy::RegionHierarchy;
use crate::services::session::Cursor;
use std::fmt::Display;

/// 批改上下文
#[derive(Debug, Clone)]
pub struct GradeCtx {
    /// 学生序号（0 开始，仅用于日志显示时 +1）
    pub student_index: usize,
    /// 当前计分单元的展示编号，如 "2" 或 "2.1"
    pub unit_label: String,
}

impl GradeCtx {
    /// 根据题目层级和会话游标构造展示上下文
    pub fn new(hierarchy: &RegionHierarchy, cursor: Cursor) -> Self {
        let unit_label = match hierarchy.questions().get(cursor.question) {
            Some(q) if !q.subs.is_empty() => format!("{}.{}", q.id, cursor.sub + 1),
            Some(q) => q.id.to_string(),
            None => "?".to_string(),
        };
        Self {
            student_index: cursor.student,
            unit_label,
        }
    }
}

impl Display for GradeCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[学生#{} 题目#{}]", self.student_index + 1, self.unit_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::region::Region;

    #[test]
    fn label_uses_sub_id_when_subs_exist() {
        let mut h = RegionHierarchy::new();
        h.classify(Region::new(0, 0, 200, 100), false).unwrap();
        h.classify(Region::new(10, 10, 50, 30), false).unwrap();

        let ctx = GradeCtx::new(&h, Cursor::new(0, 0, 1));
        assert_eq!(ctx.unit_label, "1.1");
        assert_eq!(ctx.to_string(), "[学生#2 题目#1.1]");
    }

    #[test]
    fn label_uses_question_id_without_subs() {
        let mut h = RegionHierarchy::new();
        h.classify(Region::new(0, 0, 200, 100), false).unwrap();
        let ctx = GradeCtx::new(&h, Cursor::new(0, 0, 0));
        assert_eq!(ctx.unit_label, "1");
    }
}
