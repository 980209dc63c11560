//! # shi-probe
//!
//! Shi 媒体类型识别引擎: 对一段格式未知的字节流运行一组格式探测函数,
//! 产出零个或多个带置信度分数的媒体类型建议, 供宿主管线挑选下游组件.
//!
//! 引擎只检查流的有界前缀 (偶尔包括有界后缀), 不解码、不解封装、
//! 不修改输入; 最坏情况是保持沉默.

pub mod context;
pub mod kernels;
pub mod probes;
pub mod registry;
pub mod source;

// 重导出常用类型
pub use context::{Cursor, Suggestion, TypeFind};
pub use probes::register_all;
pub use registry::{Kernel, ProbeFn, ProbeRank, Registration, TypeFindRegistry};
pub use source::{ByteSource, MemorySource};
