//! 批改会话 - 业务能力层
//!
//! 三轴（大题、小题、学生）可恢复迭代状态机 + 分数张量。
//! 状态迁移：`Idle → Running → {Paused, Finished}`，
//! 只有 `Running` 状态持有活动游标。
//!
//! 推进顺序为学生最快：学生走完一轮后小题进位，小题走完后大题进位，
//! 大题走完即批改结束。

use crate::error::{AppError, AppResult, ConfigError, StateError};
use crate::models::hierarchy::RegionHierarchy;
use tracing::debug;

/// 会话游标：当前批到哪个大题、小题、学生（均为 0 开始）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    pub question: usize,
    pub sub: usize,
    pub student: usize,
}

impl Cursor {
    pub fn new(question: usize, sub: usize, student: usize) -> Self {
        Self {
            question,
            sub,
            student,
        }
    }

    /// 是否处于最初位置（不可再回退）
    pub fn is_origin(&self) -> bool {
        self.question == 0 && self.sub == 0 && self.student == 0
    }
}

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Finished,
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Running => "Running",
            SessionState::Paused => "Paused",
            SessionState::Finished => "Finished",
        }
    }
}

/// 单次推进的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// 还有后续计分单元
    Continued,
    /// 全部批改完成，会话进入 Finished
    Finished,
}

/// 分数张量：学生 × 大题 × 计分单元，默认 0
///
/// 无小题的大题只使用第 0 个单元格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreTensor {
    data: Vec<Vec<Vec<u32>>>,
}

impl ScoreTensor {
    pub fn zeros(students: usize, questions: usize, units: usize) -> Self {
        Self {
            data: vec![vec![vec![0; units]; questions]; students],
        }
    }

    /// 校验外部数据的维度后接管
    pub fn from_raw(
        data: Vec<Vec<Vec<u32>>>,
        students: usize,
        questions: usize,
        units: usize,
    ) -> AppResult<Self> {
        if data.len() != students
            || data.iter().any(|per_student| {
                per_student.len() != questions
                    || per_student.iter().any(|per_q| per_q.len() != units)
            })
        {
            return Err(AppError::corrupt(format!(
                "分数张量维度与会话不符（期望 {}×{}×{}）",
                students, questions, units
            )));
        }
        Ok(Self { data })
    }

    pub fn get(&self, cursor: Cursor) -> u32 {
        self.data[cursor.student][cursor.question][cursor.sub]
    }

    fn set(&mut self, cursor: Cursor, score: u32) {
        self.data[cursor.student][cursor.question][cursor.sub] = score;
    }

    pub fn raw(&self) -> &Vec<Vec<Vec<u32>>> {
        &self.data
    }
}

/// 批改会话
///
/// 独占持有分数张量；题目层级在会话期间只读
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingSession {
    state: SessionState,
    cursor: Cursor,
    scores: ScoreTensor,
    /// 每个大题的有效计分单元数（无小题的大题为 1）
    unit_counts: Vec<usize>,
    total_students: usize,
    max_units: usize,
    max_score: u32,
}

impl GradingSession {
    /// 创建全新会话，游标位于 (0, 0, 0)
    ///
    /// 学生数为 0 的会话没有任何计分单元可推进，直接拒绝
    pub fn fresh(
        hierarchy: &RegionHierarchy,
        total_students: usize,
        max_score: u32,
    ) -> AppResult<Self> {
        if total_students == 0 {
            return Err(AppError::Config(ConfigError::NoStudents));
        }
        let unit_counts: Vec<usize> = hierarchy
            .questions()
            .iter()
            .map(|q| q.scoring_units())
            .collect();
        let max_units = hierarchy.max_scoring_units();
        Ok(Self {
            state: SessionState::Idle,
            cursor: Cursor::default(),
            scores: ScoreTensor::zeros(total_students, hierarchy.len(), max_units),
            unit_counts,
            total_students,
            max_units,
            max_score,
        })
    }

    /// 从存档恢复会话
    ///
    /// 游标必须对*当前*题目层级合法，分数张量维度必须完全一致，
    /// 否则判定存档损坏。绝不截断或补齐张量——那会丢弃或捏造分数。
    pub fn restore(
        hierarchy: &RegionHierarchy,
        total_students: usize,
        cursor: Cursor,
        raw_scores: Vec<Vec<Vec<u32>>>,
        max_score: u32,
    ) -> AppResult<Self> {
        if total_students == 0 {
            return Err(AppError::corrupt("存档的学生数为 0"));
        }
        let mut session = Self::fresh(hierarchy, total_students, max_score)?;
        session.scores =
            ScoreTensor::from_raw(raw_scores, total_students, hierarchy.len(), session.max_units)?;

        let in_bounds = cursor.question < hierarchy.len()
            && cursor.sub < session.unit_counts[cursor.question]
            && cursor.student < total_students;
        if !in_bounds {
            return Err(AppError::State(StateError::CursorOutOfBounds {
                question: cursor.question,
                sub: cursor.sub,
                student: cursor.student,
            }));
        }
        session.cursor = cursor;
        Ok(session)
    }

    /// 开始批改：Idle → Running
    pub fn start(&mut self) -> AppResult<()> {
        self.transition(SessionState::Idle, SessionState::Running, "start")
    }

    /// 暂停批改：Running → Paused
    ///
    /// 暂停后直到恢复为止不允许任何分数变更，调用方负责随即持久化
    pub fn pause(&mut self) -> AppResult<()> {
        self.transition(SessionState::Running, SessionState::Paused, "pause")
    }

    /// 恢复批改：Paused → Running
    pub fn resume(&mut self) -> AppResult<()> {
        self.transition(SessionState::Paused, SessionState::Running, "resume")
    }

    fn transition(
        &mut self,
        from: SessionState,
        to: SessionState,
        action: &'static str,
    ) -> AppResult<()> {
        if self.state != from {
            return Err(AppError::State(StateError::InvalidTransition {
                from: self.state.name(),
                action,
            }));
        }
        self.state = to;
        Ok(())
    }

    /// 记录当前计分单元的分数并推进游标
    ///
    /// 越界分数直接拒绝（由调用方重新提示），绝不静默截断
    pub fn advance(&mut self, score: u32) -> AppResult<StepOutcome> {
        if self.state != SessionState::Running {
            return Err(AppError::State(StateError::InvalidTransition {
                from: self.state.name(),
                action: "advance",
            }));
        }
        if score > self.max_score {
            return Err(AppError::score_out_of_range(score, self.max_score));
        }

        self.scores.set(self.cursor, score);
        debug!(
            "记分: 学生 {} 大题 {} 单元 {} = {}",
            self.cursor.student, self.cursor.question, self.cursor.sub, score
        );

        self.cursor.student += 1;
        if self.cursor.student == self.total_students {
            self.cursor.student = 0;
            self.cursor.sub += 1;
            if self.cursor.sub == self.unit_counts[self.cursor.question] {
                self.cursor.sub = 0;
                self.cursor.question += 1;
                if self.cursor.question == self.unit_counts.len() {
                    self.state = SessionState::Finished;
                    return Ok(StepOutcome::Finished);
                }
            }
        }
        Ok(StepOutcome::Continued)
    }

    /// 沿推进顺序的逆序回退一步
    ///
    /// 返回 `Ok(false)` 表示已在起点、请求被拒绝（张量不被触碰）
    pub fn back(&mut self) -> AppResult<bool> {
        if self.state != SessionState::Running {
            return Err(AppError::State(StateError::InvalidTransition {
                from: self.state.name(),
                action: "back",
            }));
        }
        if self.cursor.is_origin() {
            return Ok(false);
        }

        if self.cursor.student > 0 {
            self.cursor.student -= 1;
        } else {
            self.cursor.student = self.total_students - 1;
            if self.cursor.sub > 0 {
                self.cursor.sub -= 1;
            } else {
                self.cursor.question -= 1;
                self.cursor.sub = self.unit_counts[self.cursor.question] - 1;
            }
        }
        Ok(true)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn scores(&self) -> &ScoreTensor {
        &self.scores
    }

    pub fn total_students(&self) -> usize {
        self.total_students
    }

    pub fn total_questions(&self) -> usize {
        self.unit_counts.len()
    }

    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    /// 某个大题的有效计分单元数
    pub fn unit_count(&self, question: usize) -> usize {
        self.unit_counts[question]
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::region::Region;

    /// 一个大题带两个小题，再加一个无小题的大题
    fn two_question_hierarchy() -> RegionHierarchy {
        let mut h = RegionHierarchy::new();
        h.classify(Region::new(0, 0, 200, 100), false).unwrap();
        h.classify(Region::new(10, 10, 50, 30), false).unwrap();
        h.classify(Region::new(70, 10, 50, 30), false).unwrap();
        h.classify(Region::new(0, 200, 200, 100), false).unwrap();
        h
    }

    fn one_question_two_subs() -> RegionHierarchy {
        let mut h = RegionHierarchy::new();
        h.classify(Region::new(0, 0, 200, 100), false).unwrap();
        h.classify(Region::new(10, 10, 50, 30), false).unwrap();
        h.classify(Region::new(70, 10, 50, 30), false).unwrap();
        h
    }

    #[test]
    fn score_tensor_fills_student_fastest() {
        // 1 大题 2 小题，2 名学生：按推进顺序给分 3,1,2,4
        let h = one_question_two_subs();
        let mut s = GradingSession::fresh(&h, 2, 9).unwrap();
        s.start().unwrap();
        assert_eq!(s.advance(3).unwrap(), StepOutcome::Continued);
        assert_eq!(s.advance(1).unwrap(), StepOutcome::Continued);
        assert_eq!(s.advance(2).unwrap(), StepOutcome::Continued);
        assert_eq!(s.advance(4).unwrap(), StepOutcome::Finished);
        assert_eq!(s.scores().raw(), &vec![vec![vec![3, 2]], vec![vec![1, 4]]]);
        assert_eq!(s.state(), SessionState::Finished);
    }

    #[test]
    fn full_pass_reaches_finished_and_rejects_mutation() {
        let h = two_question_hierarchy();
        let mut s = GradingSession::fresh(&h, 3, 9).unwrap();
        s.start().unwrap();
        // 单元总数 = 学生3 × (大题1 的 2 单元 + 大题2 的 1 单元)
        let total_units = 3 * (2 + 1);
        for i in 0..total_units {
            let outcome = s.advance(1).unwrap();
            if i + 1 == total_units {
                assert_eq!(outcome, StepOutcome::Finished);
            } else {
                assert_eq!(outcome, StepOutcome::Continued);
            }
        }
        assert_eq!(s.state(), SessionState::Finished);
        assert!(s.advance(1).is_err());
        assert!(s.back().is_err());
    }

    #[test]
    fn back_at_origin_is_rejected_noop() {
        let h = two_question_hierarchy();
        let mut s = GradingSession::fresh(&h, 2, 9).unwrap();
        s.start().unwrap();
        let before = s.scores().clone();
        assert!(!s.back().unwrap());
        assert_eq!(s.cursor(), Cursor::default());
        assert_eq!(s.scores(), &before);
    }

    #[test]
    fn back_reverses_advance_exactly() {
        let h = two_question_hierarchy();
        let mut s = GradingSession::fresh(&h, 2, 9).unwrap();
        s.start().unwrap();
        let mut trail = vec![s.cursor()];
        for _ in 0..5 {
            s.advance(0).unwrap();
            trail.push(s.cursor());
        }
        // 逐步回退，游标必须沿原路返回
        trail.pop();
        while let Some(expected) = trail.pop() {
            assert!(s.back().unwrap());
            assert_eq!(s.cursor(), expected);
        }
        assert!(!s.back().unwrap());
    }

    #[test]
    fn out_of_range_score_rejected_without_mutation() {
        let h = two_question_hierarchy();
        let mut s = GradingSession::fresh(&h, 2, 5).unwrap();
        s.start().unwrap();
        let err = s.advance(6).unwrap_err();
        assert!(matches!(
            err,
            AppError::Input(crate::error::InputError::ScoreOutOfRange { score: 6, max: 5 })
        ));
        assert_eq!(s.cursor(), Cursor::default());
        assert_eq!(s.scores().get(Cursor::default()), 0);
        // 合法分数随后被接受
        s.advance(5).unwrap();
        assert_eq!(s.scores().get(Cursor::default()), 5);
    }

    #[test]
    fn pause_only_from_running() {
        let h = two_question_hierarchy();
        let mut s = GradingSession::fresh(&h, 2, 9).unwrap();
        assert!(s.pause().is_err());
        s.start().unwrap();
        s.advance(3).unwrap();
        s.pause().unwrap();
        assert!(s.advance(1).is_err());
        s.resume().unwrap();
        s.advance(1).unwrap();
    }

    #[test]
    fn fresh_rejects_zero_students() {
        let h = two_question_hierarchy();
        let err = GradingSession::fresh(&h, 0, 9).unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::NoStudents)));
        // 存档声称学生数为 0 时按存档损坏处理
        let err2 = GradingSession::restore(&h, 0, Cursor::default(), Vec::new(), 9).unwrap_err();
        assert!(err2.is_corrupt_state());
    }

    #[test]
    fn restore_rejects_out_of_bounds_cursor() {
        let h = two_question_hierarchy();
        let scores = ScoreTensor::zeros(2, 2, 2).raw().clone();
        // 大题 0 有 2 个单元，小题索引 2 越界
        let err =
            GradingSession::restore(&h, 2, Cursor::new(0, 2, 0), scores.clone(), 9).unwrap_err();
        assert!(err.is_corrupt_state());
        // 学生索引越界
        let err2 = GradingSession::restore(&h, 2, Cursor::new(0, 0, 2), scores, 9).unwrap_err();
        assert!(err2.is_corrupt_state());
    }

    #[test]
    fn restore_rejects_mismatched_tensor() {
        let h = two_question_hierarchy();
        let bad = ScoreTensor::zeros(2, 3, 2).raw().clone();
        let err = GradingSession::restore(&h, 2, Cursor::default(), bad, 9).unwrap_err();
        assert!(err.is_corrupt_state());
    }

    #[test]
    fn restore_resumes_mid_session() {
        let h = two_question_hierarchy();
        let mut first = GradingSession::fresh(&h, 2, 9).unwrap();
        first.start().unwrap();
        first.advance(3).unwrap();
        first.advance(4).unwrap();
        first.pause().unwrap();

        let mut resumed = GradingSession::restore(
            &h,
            2,
            first.cursor(),
            first.scores().raw().clone(),
            9,
        )
        .unwrap();
        resumed.start().unwrap();
        assert_eq!(resumed.cursor(), first.cursor());
        assert_eq!(resumed.scores(), first.scores());
    }
}
