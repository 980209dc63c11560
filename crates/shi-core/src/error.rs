//! 统一错误类型定义.
//!
//! 只有跨越公共边界的错误出现在这里; 探测过程中的"数据不可用"与
//! "头部不合法"属于探测函数的内部控制流, 以 `Option` 表达, 不构成错误.

use thiserror::Error;

/// Shi 识别库统一错误类型
#[derive(Debug, Error)]
pub enum ShiError {
    /// 注册表中已存在同名探测器
    #[error("重复的探测器名称: {0}")]
    DuplicateName(String),

    /// 媒体类型标签文本无法解析
    #[error("无效的媒体类型标签: {0}")]
    InvalidLabel(String),
}

/// Shi 识别库统一 Result 类型
pub type ShiResult<T> = Result<T, ShiError>;
