//! 应用宿主
//!
//! 批改核心只暴露同步操作，这里的宿主循环负责把操作员在终端里的
//! 离散动作逐条喂给核心。卷面图像的渲染属于外部协作者，宿主只
//! 展示当前卷面的文件路径。

use crate::config::Config;
use crate::error::{AppError, ConfigError, InputError, StateError};
use crate::models::hierarchy::RegionHierarchy;
use crate::models::region::{Point, Region};
use crate::services::persistence;
use crate::services::roster::StudentRoster;
use crate::services::session::StepOutcome;
use crate::utils::logging;
use crate::workflow::grading_flow::GradingFlow;
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use tracing::{error, info, warn};

/// 可执行的子命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// 交互式划分大题 / 小题选区
    Define,
    /// 批改（默认）
    Grade,
}

impl AppCommand {
    pub fn parse(arg: Option<&str>) -> Option<Self> {
        match arg {
            None | Some("grade") => Some(AppCommand::Grade),
            Some("define") => Some(AppCommand::Define),
            Some(_) => None,
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)
            .with_context(|| format!("初始化日志文件失败: {}", config.output_log_file))?;
        Ok(Self { config })
    }

    /// 运行指定子命令
    pub fn run(&self, command: AppCommand) -> Result<()> {
        match command {
            AppCommand::Define => self.run_define(),
            AppCommand::Grade => self.run_grade(),
        }
    }

    /// 划分流程：逐行读入确认的矩形，归类后写出划分配置
    ///
    /// 每行格式 `x y w h`，行尾附加 `m` 表示该选区并入上一大题
    /// （跨页段）。空行或 EOF 结束。
    fn run_define(&self) -> Result<()> {
        info!("✏️ 选区划分：每行输入 x y w h [m]，空行结束");
        let mut hierarchy = RegionHierarchy::new();
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line.context("读取输入失败")?;
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            match parse_region_line(line) {
                Some((region, merge)) => match hierarchy.classify(region, merge) {
                    Ok(placement) => info!("✓ {} → {:?}", region, placement),
                    // 退化选区：拒绝并重新提示，不传播
                    Err(e) => warn!("⚠ 选区被拒绝: {}", e),
                },
                None => warn!("⚠ 无法解析: {}（格式: x y w h [m]）", line),
            }
        }

        if hierarchy.is_empty() {
            warn!("⚠ 没有任何大题，不写出配置");
            return Ok(());
        }
        let path = self.config.hierarchy_path();
        persistence::save_hierarchy(&path, &hierarchy)
            .with_context(|| format!("写入题目划分失败: {}", path.display()))?;
        Ok(())
    }

    /// 批改流程
    fn run_grade(&self) -> Result<()> {
        let hierarchy = match persistence::load_hierarchy(&self.config.hierarchy_path()) {
            Ok(h) => h,
            // 没有划分配置不是致命错误，转入划分流程即可
            Err(AppError::Config(ConfigError::HierarchyMissing { path })) => {
                warn!("⚠ 未找到题目划分配置 {}，请先运行 define", path);
                return Ok(());
            }
            Err(e) => return Err(e).context("读取题目划分失败"),
        };

        let roster = StudentRoster::discover(&self.config.stitched_path())
            .context("扫描学生整卷目录失败")?;
        if roster.is_empty() {
            warn!("⚠ 整卷目录中没有学生卷面，无法批改");
            return Ok(());
        }

        let mut flow = match GradingFlow::open(&self.config, hierarchy.clone(), roster.len()) {
            Ok(flow) => flow,
            // 完成态存档是有效的最终结果，不提示放弃
            Err(AppError::State(StateError::SessionComplete)) => {
                info!(
                    "✅ 该场批改已全部完成，最终结果: {}",
                    self.config.session_path().display()
                );
                return Ok(());
            }
            Err(e) if e.is_corrupt_state() => {
                // 损坏的存档只有一种恢复方式：放弃并重新开始
                error!("❌ {}", e);
                if !self.confirm_discard()? {
                    info!("已退出，存档保持原样");
                    return Ok(());
                }
                std::fs::remove_file(self.config.session_path())
                    .context("删除损坏存档失败")?;
                GradingFlow::open(&self.config, hierarchy, roster.len())
                    .context("重新创建批改会话失败")?
            }
            Err(e) => return Err(e).context("打开批改会话失败"),
        };

        logging::log_startup(flow.hierarchy().len(), flow.session().total_students());
        self.grade_loop(&mut flow, &roster)
    }

    /// 宿主事件循环：严格按操作员动作驱动核心
    fn grade_loop(&self, flow: &mut GradingFlow, roster: &StudentRoster) -> Result<()> {
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        while flow.session().is_running() {
            let cursor = flow.session().cursor();
            match roster.sheet(cursor.student) {
                Ok(sheet) => {
                    info!("{} 卷面: {}", flow.ctx(), sheet.display());
                }
                Err(e) => {
                    // 缺卷面：记警告跳过该学生，不中止批改
                    warn!("⚠ {}，跳过", e);
                    flow.score(0)?;
                    continue;
                }
            }
            print!(
                "分数(0-{}) / b=回退 / m x y ...=批注 / u=撤销批注 / q=暂停保存: ",
                flow.session().max_score()
            );
            io::stdout().flush().ok();

            let Some(line) = lines.next() else {
                // 输入流结束视同暂停
                flow.pause_and_save().context("暂停存盘失败")?;
                info!("⏸ 输入结束，进度已保存");
                return Ok(());
            };
            let line = line.context("读取输入失败")?;
            let input = line.trim();

            match input {
                "" => continue,
                "q" => {
                    flow.pause_and_save().context("暂停存盘失败")?;
                    info!("⏸ 已暂停，进度已保存");
                    return Ok(());
                }
                "b" => {
                    if !flow.back()? {
                        info!("开头不可退回");
                    }
                }
                "u" => {
                    if !flow.undo_stroke() {
                        info!("没有可撤销的批注");
                    }
                }
                _ if input.starts_with('m') => match parse_stroke_line(input) {
                    Some(points) => {
                        let mut iter = points.into_iter();
                        if let Some(first) = iter.next() {
                            flow.begin_stroke(first);
                            for p in iter {
                                flow.extend_stroke(p);
                            }
                            flow.commit_stroke()?;
                            info!("✓ 批注已记录");
                        }
                    }
                    None => warn!("⚠ 无法解析批注（格式: m x1 y1 x2 y2 ...）"),
                },
                _ => match input.parse::<u32>() {
                    Ok(score) => match flow.score(score) {
                        Ok(StepOutcome::Finished) => break,
                        Ok(StepOutcome::Continued) => {}
                        // 越界分数：拒绝并重新提示，绝不静默截断
                        Err(AppError::Input(InputError::ScoreOutOfRange { score, max })) => {
                            warn!("⚠ 分数 {} 超出 [0, {}]，请重新输入", score, max);
                        }
                        Err(e) => return Err(e).context("记分失败"),
                    },
                    Err(_) => warn!("⚠ 无法识别的输入: {}", input),
                },
            }
        }

        // 终态存盘后会话即告终结
        flow.save().context("写入最终结果失败")?;
        let session = flow.session();
        let total_units: usize = (0..session.total_questions())
            .map(|q| session.unit_count(q))
            .sum::<usize>()
            * session.total_students();
        logging::print_final_stats(total_units, &self.config.output_log_file);
        Ok(())
    }

    /// 向操作员确认是否放弃损坏的存档
    fn confirm_discard(&self) -> Result<bool> {
        print!("存档已损坏，输入 y 放弃存档重新开始，其他输入退出: ");
        io::stdout().flush().ok();
        let mut answer = String::new();
        io::stdin().read_line(&mut answer).context("读取输入失败")?;
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }
}

/// 解析 "x y w h [m]" 形式的选区行
fn parse_region_line(line: &str) -> Option<(Region, bool)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let (coords, merge) = match parts.as_slice() {
        [x, y, w, h] => ([*x, *y, *w, *h], false),
        [x, y, w, h, flag] if flag.eq_ignore_ascii_case("m") => ([*x, *y, *w, *h], true),
        _ => return None,
    };
    let mut values = [0i32; 4];
    for (slot, raw) in values.iter_mut().zip(coords) {
        *slot = raw.parse().ok()?;
    }
    Some((Region::new(values[0], values[1], values[2], values[3]), merge))
}

/// 解析 "m x1 y1 x2 y2 ..." 形式的批注行（局部坐标）
fn parse_stroke_line(line: &str) -> Option<Vec<Point>> {
    let nums: Result<Vec<i32>, _> = line
        .split_whitespace()
        .skip(1)
        .map(str::parse)
        .collect();
    let nums = nums.ok()?;
    if nums.is_empty() || nums.len() % 2 != 0 {
        return None;
    }
    Some(nums.chunks(2).map(|p| Point(p[0], p[1])).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_line_parsing() {
        assert_eq!(
            parse_region_line("10 20 30 40"),
            Some((Region::new(10, 20, 30, 40), false))
        );
        assert_eq!(
            parse_region_line("10 20 30 40 m"),
            Some((Region::new(10, 20, 30, 40), true))
        );
        assert!(parse_region_line("10 20 30").is_none());
        assert!(parse_region_line("a b c d").is_none());
    }

    #[test]
    fn stroke_line_parsing() {
        assert_eq!(
            parse_stroke_line("m 2 3 2 5"),
            Some(vec![Point(2, 3), Point(2, 5)])
        );
        assert!(parse_stroke_line("m 2 3 2").is_none());
        assert!(parse_stroke_line("m").is_none());
    }

    #[test]
    fn command_parsing() {
        assert_eq!(AppCommand::parse(None), Some(AppCommand::Grade));
        assert_eq!(AppCommand::parse(Some("grade")), Some(AppCommand::Grade));
        assert_eq!(AppCommand::parse(Some("define")), Some(AppCommand::Define));
        assert_eq!(AppCommand::parse(Some("bogus")), None);
    }
}
