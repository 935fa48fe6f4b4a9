//! 学生卷面清单 - 业务能力层
//!
//! 扫描整卷目录得到学生数与每个学生的卷面路径。
//! 图像的加载与显示属于外部协作者，这里只管文件清单。

use crate::error::{AppError, AppResult, AssetError, FileError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// 认可的卷面图像扩展名
const SHEET_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// 学生卷面清单
///
/// 学生序号即清单下标（0 开始），顺序为文件名排序
#[derive(Debug, Clone)]
pub struct StudentRoster {
    sheets: Vec<PathBuf>,
}

impl StudentRoster {
    /// 扫描目录，收集全部卷面文件
    pub fn discover(dir: &Path) -> AppResult<Self> {
        if !dir.is_dir() {
            return Err(AppError::File(FileError::DirectoryNotFound {
                path: dir.display().to_string(),
            }));
        }
        let entries = fs::read_dir(dir)
            .map_err(|e| AppError::file_read_failed(dir.display().to_string(), e))?;

        let mut sheets: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| SHEET_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        sheets.sort();
        Ok(Self { sheets })
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// 取第 `student` 个学生的卷面路径
    ///
    /// 文件在扫描后被移走时返回 `MissingAsset`：调用方记警告并跳过
    /// 该学生，不中止整场批改
    pub fn sheet(&self, student: usize) -> AppResult<&Path> {
        let path = self.sheets.get(student).ok_or_else(|| {
            AppError::Asset(AssetError::SheetMissing {
                student,
                path: String::from("<超出清单范围>"),
            })
        })?;
        if !path.exists() {
            warn!("⚠ 学生 {} 的卷面已不存在: {}", student + 1, path.display());
            return Err(AppError::Asset(AssetError::SheetMissing {
                student,
                path: path.display().to_string(),
            }));
        }
        Ok(path)
    }
}
