//! 会话持久化 - 业务能力层
//!
//! 题目层级与批改会话的落盘 / 读取。只有一种带校验的固定 schema：
//! 读到任何不符合 schema 的内容一律判为存档损坏，绝不做尽力解释。
//! 写入遵循"先写临时文件再原子改名"，保证不会用残缺数据覆盖
//! 一份有效存档。键序确定，状态不变时两次落盘字节一致。

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError, StateError};
use crate::models::hierarchy::RegionHierarchy;
use crate::models::question::{Question, SubQuestion};
use crate::models::region::Region;
use crate::services::annotations::{AnnotationStore, Stroke};
use crate::services::session::{Cursor, GradingSession};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

// ========== 题目划分配置 schema ==========

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct HierarchyFile {
    questions: Vec<QuestionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuestionRecord {
    id: usize,
    segments: Vec<Region>,
    subs: Vec<SubRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubRecord {
    /// 展示编号 "大题号.小题号"
    id: String,
    segments: Vec<Region>,
}

// ========== 批改存档 schema ==========

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionFile {
    total_students: usize,
    total_questions: usize,
    present_question: usize,
    present_sub: usize,
    present_student: usize,
    scores: Vec<Vec<Vec<u32>>>,
    /// 键为 "学生|大题|小题"，各为不补零的十进制索引
    marks: BTreeMap<String, Vec<Stroke>>,
}

// ========== 题目划分配置读写 ==========

/// 把题目层级写入配置文件
pub fn save_hierarchy(path: &Path, hierarchy: &RegionHierarchy) -> AppResult<()> {
    let file = HierarchyFile {
        questions: hierarchy
            .questions()
            .iter()
            .map(|q| QuestionRecord {
                id: q.id,
                segments: q.segments.clone(),
                subs: q
                    .subs
                    .iter()
                    .map(|s| SubRecord {
                        id: s.label(q.id),
                        segments: s.segments.clone(),
                    })
                    .collect(),
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| AppError::corrupt(format!("序列化题目划分失败: {}", e)))?;
    write_atomic(path, &json)?;
    info!("✓ 题目划分已写入 {}", path.display());
    Ok(())
}

/// 读取题目划分配置
///
/// 文件不存在 → `ConfigurationMissing`（应转入划分流程，而非致命错误）
pub fn load_hierarchy(path: &Path) -> AppResult<RegionHierarchy> {
    if !path.exists() {
        return Err(AppError::Config(ConfigError::HierarchyMissing {
            path: path.display().to_string(),
        }));
    }
    let content =
        fs::read_to_string(path).map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
    let file: HierarchyFile = serde_json::from_str(&content)?;

    if file.questions.is_empty() {
        return Err(AppError::Config(ConfigError::EmptyHierarchy));
    }

    let mut questions = Vec::with_capacity(file.questions.len());
    for (idx, record) in file.questions.into_iter().enumerate() {
        if record.id != idx + 1 {
            return Err(AppError::corrupt(format!(
                "大题编号不连续: 第 {} 项的编号为 {}",
                idx + 1,
                record.id
            )));
        }
        if record.segments.is_empty() {
            return Err(AppError::corrupt(format!("大题 {} 没有任何选区段", record.id)));
        }
        let mut subs = Vec::with_capacity(record.subs.len());
        for (sub_idx, sub) in record.subs.into_iter().enumerate() {
            let expected = format!("{}.{}", record.id, sub_idx + 1);
            if sub.id != expected {
                return Err(AppError::corrupt(format!(
                    "小题编号不符: 期望 {}，实际 {}",
                    expected, sub.id
                )));
            }
            if sub.segments.is_empty() {
                return Err(AppError::corrupt(format!("小题 {} 没有任何选区段", sub.id)));
            }
            subs.push(SubQuestion {
                index: sub_idx + 1,
                segments: sub.segments,
            });
        }
        questions.push(Question {
            id: record.id,
            segments: record.segments,
            subs,
        });
    }

    debug!("读取题目划分: {} 个大题", questions.len());
    Ok(RegionHierarchy::from_questions(questions))
}

// ========== 批改存档读写 ==========

/// 把会话状态与批注落盘
///
/// 幂等：状态不变时两次写出的字节完全一致
pub fn save_session(
    path: &Path,
    session: &GradingSession,
    annotations: &AnnotationStore,
) -> AppResult<()> {
    let cursor = session.cursor();
    let marks: BTreeMap<String, Vec<Stroke>> = annotations
        .marks()
        .iter()
        .map(|(key, strokes)| (format!("{}|{}|{}", key.student, key.question, key.sub), strokes.clone()))
        .collect();

    let file = SessionFile {
        total_students: session.total_students(),
        total_questions: session.total_questions(),
        present_question: cursor.question,
        present_sub: cursor.sub,
        present_student: cursor.student,
        scores: session.scores().raw().clone(),
        marks,
    };
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| AppError::corrupt(format!("序列化存档失败: {}", e)))?;
    write_atomic(path, &json)?;
    info!("✓ 批改进度已写入 {}", path.display());
    Ok(())
}

/// 读取批改存档并对照当前题目层级校验
///
/// - 文件不存在 → `Ok(None)`（全新开始）
/// - 游标停在末尾之后一格（上次批改已全部完成）→ `SessionComplete`，
///   存档是有效的最终结果，不按损坏处理
/// - JSON 不合法、张量维度不符、游标或批注键越界 → 存档损坏，
///   调用方只能提示"放弃存档重新开始"，绝不自动修复
pub fn load_session(
    path: &Path,
    hierarchy: &RegionHierarchy,
    config: &Config,
) -> AppResult<Option<(GradingSession, AnnotationStore)>> {
    if !path.exists() {
        debug!("没有发现批改存档，从头开始");
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
    let file: SessionFile = serde_json::from_str(&content)?;

    if file.total_questions != hierarchy.len() {
        return Err(AppError::corrupt(format!(
            "存档的大题数 {} 与当前划分的 {} 不一致",
            file.total_questions,
            hierarchy.len()
        )));
    }

    // 完成态存档的游标落在末尾之后一格，与损坏区分开，
    // 避免向操作员提示放弃一份有效的最终结果
    if file.present_question == hierarchy.len()
        && file.present_sub == 0
        && file.present_student == 0
    {
        let units = hierarchy.max_scoring_units();
        let dims_ok = file.scores.len() == file.total_students
            && file.scores.iter().all(|per_student| {
                per_student.len() == hierarchy.len()
                    && per_student.iter().all(|per_q| per_q.len() == units)
            });
        if !dims_ok {
            return Err(AppError::corrupt("完成态存档的分数张量维度不符"));
        }
        return Err(AppError::State(StateError::SessionComplete));
    }

    let cursor = Cursor::new(file.present_question, file.present_sub, file.present_student);
    let session = GradingSession::restore(
        hierarchy,
        file.total_students,
        cursor,
        file.scores,
        config.max_score,
    )?;

    let mut marks: BTreeMap<Cursor, Vec<Stroke>> = BTreeMap::new();
    for (key, strokes) in file.marks {
        let parsed = parse_mark_key(&key)?;
        if parsed.student >= file.total_students
            || parsed.question >= hierarchy.len()
            || parsed.sub >= hierarchy.questions()[parsed.question].scoring_units()
        {
            return Err(AppError::corrupt(format!("批注键越界: {}", key)));
        }
        if strokes.iter().any(Vec::is_empty) {
            return Err(AppError::corrupt(format!("批注键 {} 下存在空笔画", key)));
        }
        marks.insert(parsed, strokes);
    }

    info!(
        "✓ 恢复批改存档: {} 名学生，游标 (大题 {}, 小题 {}, 学生 {})",
        file.total_students, cursor.question, cursor.sub, cursor.student
    );
    let annotations = AnnotationStore::with_marks(config.stroke_epsilon, marks);
    Ok(Some((session, annotations)))
}

/// 解析 "学生|大题|小题" 形式的批注键
fn parse_mark_key(key: &str) -> AppResult<Cursor> {
    let mut parts = key.split('|');
    let (Some(s), Some(q), Some(sub), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AppError::corrupt(format!("批注键格式不合法: {}", key)));
    };
    let parse = |v: &str| -> AppResult<usize> {
        v.parse()
            .map_err(|_| AppError::corrupt(format!("批注键格式不合法: {}", key)))
    };
    Ok(Cursor::new(parse(q)?, parse(sub)?, parse(s)?))
}

/// 先写临时文件，再原子改名到目标路径
fn write_atomic(path: &Path, contents: &str) -> AppResult<()> {
    let display = path.display().to_string();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AppError::file_write_failed(display.clone(), e))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents).map_err(|e| AppError::file_write_failed(display.clone(), e))?;
    fs::rename(&tmp, path).map_err(|e| AppError::file_write_failed(display, e))?;
    Ok(())
}
