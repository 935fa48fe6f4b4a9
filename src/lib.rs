//! # QuickGrade
//!
//! 一个扫描卷分区批改工具的核心库
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 数据层（Models）
//! - `models/region` - 选区几何（矩形、点、包含判断）
//! - `models/question` - 大题 / 小题实体
//! - `models/hierarchy` - 选区划分与归类算法
//!
//! ### ② 业务能力层（Services）
//! - `services/session` - 三轴可恢复批改状态机 + 分数张量
//! - `services/annotations` - 批注笔画采集与坐标锚定
//! - `services/persistence` - 划分配置与批改存档的读写
//! - `services/roster` - 学生卷面清单
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/cursor` - 批改上下文（展示用）
//! - `workflow/grading_flow` - 会话 + 批注 + 持久化的流程编排
//!
//! ### ④ 宿主层（App）
//! - `app` - 终端宿主循环，把操作员动作逐条喂给核心
//!
//! 核心完全同步、单线程、严格由输入驱动：没有后台计算，
//! 操作按宿主送达的顺序执行，不做重排或合批。

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::{App, AppCommand};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Placement, Point, Question, Region, RegionHierarchy, SubQuestion};
pub use services::{AnnotationStore, Cursor, GradingSession, SessionState, StepOutcome, StudentRoster};
pub use workflow::{GradeCtx, GradingFlow};
