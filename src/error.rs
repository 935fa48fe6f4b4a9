use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 配置错误（缺少题目划分配置等，可转入划分流程）
    Config(ConfigError),
    /// 会话状态错误（存档损坏、非法状态迁移）
    State(StateError),
    /// 操作员输入错误（在边界处拒绝并重新提示，不向外传播）
    Input(InputError),
    /// 文件操作错误
    File(FileError),
    /// 素材缺失错误（缺学生卷面，记警告后跳过）
    Asset(AssetError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::State(e) => write!(f, "会话状态错误: {}", e),
            AppError::Input(e) => write!(f, "输入错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Asset(e) => write!(f, "素材错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::State(e) => Some(e),
            AppError::Input(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Asset(e) => Some(e),
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 题目划分配置不存在，需要先运行划分流程
    HierarchyMissing { path: String },
    /// 划分配置为空（没有任何大题）
    EmptyHierarchy,
    /// 学生数为 0，批不出任何分数
    NoStudents,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::HierarchyMissing { path } => {
                write!(f, "未找到题目划分配置: {}（请先运行 define 流程）", path)
            }
            ConfigError::EmptyHierarchy => write!(f, "题目划分配置为空"),
            ConfigError::NoStudents => write!(f, "学生数为 0，无法建立批改会话"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// 会话状态错误
#[derive(Debug)]
pub enum StateError {
    /// 存档损坏：JSON 不合法或与当前划分配置不一致
    ///
    /// 恢复方式只有"放弃存档重新开始"，绝不自动修复
    Corrupt { reason: String },
    /// 游标越界（针对当前划分配置）
    CursorOutOfBounds {
        question: usize,
        sub: usize,
        student: usize,
    },
    /// 当前状态不允许该操作
    InvalidTransition { from: &'static str, action: &'static str },
    /// 存档记录的批改已经全部完成，没有可恢复的进度
    SessionComplete,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::Corrupt { reason } => write!(f, "存档已损坏: {}", reason),
            StateError::CursorOutOfBounds { question, sub, student } => {
                write!(
                    f,
                    "存档游标越界: 大题 {} 小题 {} 学生 {}",
                    question, sub, student
                )
            }
            StateError::InvalidTransition { from, action } => {
                write!(f, "状态 {} 下不允许操作 {}", from, action)
            }
            StateError::SessionComplete => write!(f, "该场批改已全部完成"),
        }
    }
}

impl std::error::Error for StateError {}

/// 操作员输入错误
#[derive(Debug)]
pub enum InputError {
    /// 分数超出允许范围
    ScoreOutOfRange { score: u32, max: u32 },
    /// 退化选区（宽或高为 0）
    DegenerateRegion { w: i32, h: i32 },
    /// 有未提交的批注笔画，不允许移动游标
    StrokePending,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::ScoreOutOfRange { score, max } => {
                write!(f, "分数 {} 超出范围 [0, {}]", score, max)
            }
            InputError::DegenerateRegion { w, h } => {
                write!(f, "选区退化 (宽={}, 高={})", w, h)
            }
            InputError::StrokePending => write!(f, "存在未提交的批注笔画"),
        }
    }
}

impl std::error::Error for InputError {}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 目录不存在
    DirectoryNotFound { path: String },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::DirectoryNotFound { path } => write!(f, "目录不存在: {}", path),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. } | FileError::WriteFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            FileError::DirectoryNotFound { .. } => None,
        }
    }
}

/// 素材缺失错误
#[derive(Debug)]
pub enum AssetError {
    /// 学生卷面文件不存在
    SheetMissing { student: usize, path: String },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::SheetMissing { student, path } => {
                write!(f, "学生 {} 的卷面文件不存在: {}", student + 1, path)
            }
        }
    }
}

impl std::error::Error for AssetError {}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建存档损坏错误
    pub fn corrupt(reason: impl Into<String>) -> Self {
        AppError::State(StateError::Corrupt {
            reason: reason.into(),
        })
    }

    /// 创建分数越界错误
    pub fn score_out_of_range(score: u32, max: u32) -> Self {
        AppError::Input(InputError::ScoreOutOfRange { score, max })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 该错误是否属于"存档损坏"一类
    pub fn is_corrupt_state(&self) -> bool {
        matches!(
            self,
            AppError::State(StateError::Corrupt { .. })
                | AppError::State(StateError::CursorOutOfBounds { .. })
        )
    }
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::State(StateError::Corrupt {
            reason: format!("JSON 解析失败: {}", err),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
