//! 大题 / 小题实体

use crate::models::region::Region;
use std::fmt;

/// 小题
///
/// 归属于某个大题，编号从 1 开始，展示编号为 `"大题号.小题号"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubQuestion {
    /// 小题序号（1 开始）
    pub index: usize,
    /// 小题占据的选区（可跨多段）
    pub segments: Vec<Region>,
}

impl SubQuestion {
    pub fn new(index: usize, segment: Region) -> Self {
        Self {
            index,
            segments: vec![segment],
        }
    }

    /// 展示编号，例如大题 2 的第 3 小题为 "2.3"
    pub fn label(&self, question_id: usize) -> String {
        format!("{}.{}", question_id, self.index)
    }
}

/// 大题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// 大题编号（1 开始）
    pub id: usize,
    /// 大题自身占据的选区（跨页时有多段）
    pub segments: Vec<Region>,
    /// 小题列表，可以为空（整题打一个分）
    pub subs: Vec<SubQuestion>,
}

impl Question {
    pub fn new(id: usize, segment: Region) -> Self {
        Self {
            id,
            segments: vec![segment],
            subs: Vec::new(),
        }
    }

    /// 大题自身的任一选区段是否包含 `region`
    pub fn contains(&self, region: &Region) -> bool {
        self.segments.iter().any(|seg| seg.contains(region))
    }

    /// 计分单元数：无小题的大题占一个单元
    pub fn scoring_units(&self) -> usize {
        self.subs.len().max(1)
    }

    /// 某个计分单元锚定的选区
    ///
    /// 有小题时取小题首段，无小题时取大题首段
    pub fn unit_region(&self, sub: usize) -> Option<&Region> {
        match self.subs.get(sub) {
            Some(s) => s.segments.first(),
            None => self.segments.first(),
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "大题#{} ({} 段, {} 小题)", self.id, self.segments.len(), self.subs.len())
    }
}
