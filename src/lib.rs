//! # Shi (识)
//!
//! 纯 Rust 实现的媒体类型识别库.
//!
//! 对一段格式未知的字节流运行一组格式探测函数, 产出零个或多个带
//! 置信度分数的媒体类型建议; 宿主媒体管线取最高分建议来挑选下游
//! 解封装器. 引擎只检查流的有界前缀 (偶尔包括有界后缀), 不解码、
//! 不解封装、不修改输入.
//!
//! # 快速开始
//!
//! ```rust
//! use shi::probe::MemorySource;
//!
//! let registry = shi::default_registry().unwrap();
//! let source = MemorySource::from_data(b"OggS\x00\x02".to_vec());
//! if let Some(best) = registry.recognize_best(&source) {
//!     println!("{} (分数 {})", best.label, best.score);
//! }
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `shi-core` | 分数、标签与错误类型 |
//! | `shi-probe` | 识别引擎与格式探测器目录 |

/// 核心类型 (分数、标签、错误)
pub use shi_core as core;

/// 识别引擎与格式探测器目录
pub use shi_probe as probe;

/// 获取 Shi 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建已注册所有内置探测器的注册表
pub fn default_registry() -> shi_core::ShiResult<shi_probe::TypeFindRegistry> {
    let mut registry = shi_probe::TypeFindRegistry::new();
    shi_probe::register_all(&mut registry)?;
    Ok(registry)
}
