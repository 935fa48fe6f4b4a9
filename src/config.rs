use std::path::PathBuf;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 数据根目录
    pub data_dir: String,
    /// 划分 / 存档配置所在子目录
    pub configs_dir: String,
    /// 学生整卷（已拼接）所在子目录
    pub stitched_dir: String,
    /// 题目划分配置文件名
    pub hierarchy_file: String,
    /// 批改存档文件名
    pub session_file: String,
    /// 每个计分单元允许的最高分
    pub max_score: u32,
    /// 批注笔画抽稀的最小间距（像素）
    pub stroke_epsilon: f64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 批改日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            configs_dir: "configs".to_string(),
            stitched_dir: "stitched".to_string(),
            hierarchy_file: "questions.json".to_string(),
            session_file: "result.json".to_string(),
            max_score: 9,
            stroke_epsilon: 1.0,
            verbose_logging: false,
            output_log_file: "grading_log.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            data_dir: std::env::var("QG_DATA_DIR").unwrap_or(default.data_dir),
            configs_dir: std::env::var("QG_CONFIGS_DIR").unwrap_or(default.configs_dir),
            stitched_dir: std::env::var("QG_STITCHED_DIR").unwrap_or(default.stitched_dir),
            hierarchy_file: std::env::var("QG_HIERARCHY_FILE").unwrap_or(default.hierarchy_file),
            session_file: std::env::var("QG_SESSION_FILE").unwrap_or(default.session_file),
            max_score: std::env::var("QG_MAX_SCORE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_score),
            stroke_epsilon: std::env::var("QG_STROKE_EPSILON").ok().and_then(|v| v.parse().ok()).unwrap_or(default.stroke_epsilon),
            verbose_logging: std::env::var("QG_VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("QG_OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 题目划分配置文件完整路径
    pub fn hierarchy_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
            .join(&self.configs_dir)
            .join(&self.hierarchy_file)
    }

    /// 批改存档文件完整路径
    pub fn session_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
            .join(&self.configs_dir)
            .join(&self.session_file)
    }

    /// 学生整卷目录完整路径
    pub fn stitched_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.stitched_dir)
    }
}
