//! 批改流程 - 流程层
//!
//! 把只读的题目层级、会话状态机、批注存储和持久化编排到一起，
//! 对宿主事件循环只暴露同步动作：给分、回退、笔画、暂停存盘。
//! 宿主按操作员动作逐条调用，核心不做任何重排或合批。

use crate::config::Config;
use crate::error::{AppError, AppResult, InputError};
use crate::models::hierarchy::RegionHierarchy;
use crate::models::region::{Point, Region};
use crate::services::annotations::AnnotationStore;
use crate::services::persistence;
use crate::services::session::{GradingSession, SessionState, StepOutcome};
use crate::workflow::cursor::GradeCtx;
use std::path::PathBuf;
use tracing::info;

/// 批改流程
///
/// 题目层级、分数张量和批注存储在会话存续期内由本流程独占
#[derive(Debug)]
pub struct GradingFlow {
    hierarchy: RegionHierarchy,
    session: GradingSession,
    annotations: AnnotationStore,
    session_path: PathBuf,
}

impl GradingFlow {
    /// 打开批改流程：有存档则恢复，否则全新开始
    ///
    /// 存档损坏时原样上报，由调用方向操作员提示
    /// "放弃存档重新开始"这唯一的恢复手段
    pub fn open(
        config: &Config,
        hierarchy: RegionHierarchy,
        total_students: usize,
    ) -> AppResult<Self> {
        let session_path = config.session_path();
        let (mut session, annotations) =
            match persistence::load_session(&session_path, &hierarchy, config)? {
                Some((session, annotations)) => {
                    info!("📂 继续上次的批改");
                    (session, annotations)
                }
                None => {
                    info!("🆕 开始全新批改: {} 名学生", total_students);
                    (
                        GradingSession::fresh(&hierarchy, total_students, config.max_score)?,
                        AnnotationStore::new(config.stroke_epsilon),
                    )
                }
            };
        session.start()?;
        Ok(Self {
            hierarchy,
            session,
            annotations,
            session_path,
        })
    }

    /// 当前批改上下文（用于展示）
    pub fn ctx(&self) -> GradeCtx {
        GradeCtx::new(&self.hierarchy, self.session.cursor())
    }

    /// 当前计分单元锚定的选区
    pub fn active_region(&self) -> AppResult<&Region> {
        let cursor = self.session.cursor();
        self.hierarchy
            .questions()
            .get(cursor.question)
            .and_then(|q| q.unit_region(cursor.sub))
            .ok_or_else(|| AppError::corrupt("当前计分单元没有锚定选区"))
    }

    /// 给当前计分单元打分并推进
    ///
    /// 有未提交笔画时拒绝移动游标
    pub fn score(&mut self, score: u32) -> AppResult<StepOutcome> {
        self.guard_no_pending()?;
        let outcome = self.session.advance(score)?;
        if outcome == StepOutcome::Finished {
            info!("🎉 全部批改完成");
        }
        Ok(outcome)
    }

    /// 回退一步
    ///
    /// 返回 `Ok(false)` 表示已在起点、请求被拒绝
    pub fn back(&mut self) -> AppResult<bool> {
        self.guard_no_pending()?;
        self.session.back()
    }

    /// 开始一条批注笔画（活动选区的局部坐标）
    pub fn begin_stroke(&mut self, local: Point) {
        self.annotations.begin_stroke(local);
    }

    /// 延伸进行中的笔画
    pub fn extend_stroke(&mut self, local: Point) {
        self.annotations.extend_stroke(local);
    }

    /// 提交进行中的笔画：锚定到当前游标与活动选区原点
    pub fn commit_stroke(&mut self) -> AppResult<bool> {
        let origin = self.active_region()?.origin();
        Ok(self.annotations.commit_stroke(self.session.cursor(), origin))
    }

    /// 放弃进行中的笔画
    pub fn discard_pending_stroke(&mut self) {
        self.annotations.discard_pending();
    }

    /// 撤销当前游标下最近提交的一条笔画
    pub fn undo_stroke(&mut self) -> bool {
        self.annotations.discard_last_stroke(self.session.cursor())
    }

    /// 暂停并立即存盘
    ///
    /// 存盘失败会在任何破坏性动作之前上报
    pub fn pause_and_save(&mut self) -> AppResult<()> {
        self.session.pause()?;
        persistence::save_session(&self.session_path, &self.session, &self.annotations)
    }

    /// 不改变状态地存盘（批改完成后的"保存退出"）
    pub fn save(&self) -> AppResult<()> {
        persistence::save_session(&self.session_path, &self.session, &self.annotations)
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &GradingSession {
        &self.session
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn hierarchy(&self) -> &RegionHierarchy {
        &self.hierarchy
    }

    fn guard_no_pending(&self) -> AppResult<()> {
        if self.annotations.has_pending() {
            return Err(AppError::Input(InputError::StrokePending));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::region::Region;
    use tempfile::TempDir;

    fn hierarchy() -> RegionHierarchy {
        let mut h = RegionHierarchy::new();
        h.classify(Region::new(100, 100, 200, 100), false).unwrap();
        h.classify(Region::new(110, 110, 50, 30), false).unwrap();
        h.classify(Region::new(110, 150, 50, 30), false).unwrap();
        h
    }

    fn config_in(dir: &TempDir) -> Config {
        Config {
            data_dir: dir.path().display().to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn cursor_cannot_move_with_pending_stroke() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut flow = GradingFlow::open(&config, hierarchy(), 2).unwrap();

        flow.begin_stroke(Point(2, 3));
        assert!(matches!(
            flow.score(3).unwrap_err(),
            AppError::Input(InputError::StrokePending)
        ));
        assert!(flow.back().is_err());

        flow.commit_stroke().unwrap();
        assert_eq!(flow.score(3).unwrap(), StepOutcome::Continued);
    }

    #[test]
    fn stroke_is_anchored_to_active_region_origin() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut flow = GradingFlow::open(&config, hierarchy(), 1).unwrap();

        // 活动选区是小题 1.1，原点 (110, 110)
        let key = flow.session().cursor();
        flow.begin_stroke(Point(2, 3));
        flow.extend_stroke(Point(2, 5));
        assert!(flow.commit_stroke().unwrap());
        assert_eq!(
            flow.annotations().strokes_for(key),
            &[vec![Point(112, 113), Point(112, 115)]]
        );
    }

    #[test]
    fn pause_saves_and_reopen_resumes() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let h = hierarchy();

        let mut flow = GradingFlow::open(&config, h.clone(), 2).unwrap();
        flow.score(4).unwrap();
        assert_eq!(flow.score(2).unwrap(), StepOutcome::Continued);
        let cursor = flow.session().cursor();
        flow.pause_and_save().unwrap();
        assert_eq!(flow.state(), SessionState::Paused);

        let resumed = GradingFlow::open(&config, h, 2).unwrap();
        assert_eq!(resumed.state(), SessionState::Running);
        assert_eq!(resumed.session().cursor(), cursor);
        assert_eq!(resumed.session().scores(), flow.session().scores());
    }
}
