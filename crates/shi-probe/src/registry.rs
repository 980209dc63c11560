//! 探测器注册表与调度.
//!
//! 注册表在启动期装配完成后即不可变; 识别运行只读注册表, 可在多个
//! 来源上并发进行而无需加锁. 一次识别运行是单线程的有界计算:
//! 探测函数按注册优先级降序逐个同步跑完, 中途没有挂起点.

use log::{debug, trace};
use shi_core::error::{ShiError, ShiResult};
use shi_core::score::{ProbeScore, SCORE_LIKELY};
use shi_core::MediaLabel;

use crate::context::{Suggestion, TypeFind};
use crate::kernels;
use crate::source::ByteSource;

/// 探测器调度优先级
///
/// 优先级高的探测器先运行; 建议平分时优先级也参与胜负判定.
pub type ProbeRank = u32;

/// 不参与自动识别
pub const RANK_NONE: ProbeRank = 0;

/// 兜底探测器
pub const RANK_MARGINAL: ProbeRank = 64;

/// 次选探测器
pub const RANK_SECONDARY: ProbeRank = 128;

/// 首选探测器 (可加小偏移进一步区分, 如 `RANK_PRIMARY + 2`)
pub const RANK_PRIMARY: ProbeRank = 256;

/// 探测函数类型
///
/// 探测函数是纯函数: 只通过上下文读取字节窗口并汇报建议,
/// 不跨调用保留状态, 遇到意外数据保持沉默即可.
pub type ProbeFn = fn(&mut TypeFind<'_>);

/// 探测内核: 一个探测器的具体行为
pub enum Kernel {
    /// 起始魔数匹配, 命中时以 `score` 汇报注册的默认标签
    StartsWith {
        /// 魔数字节
        magic: Vec<u8>,
        /// 命中分数
        score: ProbeScore,
    },
    /// RIFF 容器表单匹配, 命中时以满分汇报注册的默认标签
    Riff {
        /// 表单标签 (偏移 8..12 处的 4 字节)
        form: [u8; 4],
    },
    /// 自定义探测函数
    Fn(ProbeFn),
}

/// 一条探测器注册
pub struct Registration {
    /// 注册名, 注册表内唯一
    pub name: String,
    /// 调度优先级
    pub rank: ProbeRank,
    /// 探测内核
    pub kernel: Kernel,
    /// 文件扩展名提示 (供按扩展名识别)
    pub extensions: Vec<String>,
    /// 默认标签: 内核命中时汇报的标签, 也是扩展名识别的结果标签
    pub label: MediaLabel,
}

/// 探测器注册表
pub struct TypeFindRegistry {
    /// 按注册顺序存放的条目
    entries: Vec<Registration>,
    /// 宿主策略: 出现满分建议后不再运行后续探测器
    stop_at_max: bool,
}

impl TypeFindRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            stop_at_max: false,
        }
    }

    /// 注册一个探测器
    ///
    /// 同名重复注册返回 [`ShiError::DuplicateName`].
    pub fn register(&mut self, registration: Registration) -> ShiResult<()> {
        if self.entries.iter().any(|r| r.name == registration.name) {
            return Err(ShiError::DuplicateName(registration.name));
        }
        trace!(
            "typefind: 注册 {} (优先级 {})",
            registration.name,
            registration.rank
        );
        self.entries.push(registration);
        Ok(())
    }

    /// 宿主策略: 出现满分建议后提前结束调度 (默认关闭)
    pub fn set_stop_at_max(&mut self, stop: bool) {
        self.stop_at_max = stop;
    }

    /// 已注册探测器的 (名称, 优先级) 列表, 按注册顺序
    pub fn list(&self) -> Vec<(&str, ProbeRank)> {
        self.entries
            .iter()
            .map(|r| (r.name.as_str(), r.rank))
            .collect()
    }

    /// 基于内容识别来源的媒体类型 (主入口, 不看文件名)
    ///
    /// 按优先级降序 (平级按注册顺序) 运行所有探测器, 返回按
    /// (分数降序, 优先级降序, 汇报顺序) 排好的建议列表.
    /// 相同输入与相同注册表必然产出相同的列表.
    pub fn recognize(&self, source: &dyn ByteSource) -> Vec<Suggestion> {
        let mut tf = TypeFind::new(source);
        for reg in self.dispatch_order() {
            tf.set_current_rank(reg.rank);
            match &reg.kernel {
                Kernel::StartsWith { magic, score } => {
                    kernels::starts_with(&mut tf, magic, *score, &reg.label);
                }
                Kernel::Riff { form } => kernels::riff(&mut tf, form, &reg.label),
                Kernel::Fn(probe) => probe(&mut tf),
            }
            if self.stop_at_max && tf.has_max() {
                debug!("typefind: {} 给出满分建议, 提前结束调度", reg.name);
                break;
            }
        }
        tf.into_ranked()
    }

    /// 基于内容识别, 只返回最优建议
    pub fn recognize_best(&self, source: &dyn ByteSource) -> Option<Suggestion> {
        self.recognize(source).into_iter().next()
    }

    /// 按文件扩展名识别
    ///
    /// 返回扩展名提示包含该扩展名的所有注册的默认标签,
    /// 每条分数为 `SCORE_LIKELY`, 按优先级降序排列.
    pub fn recognize_by_extension(&self, filename: &str) -> Vec<Suggestion> {
        let Some((_, ext)) = filename.rsplit_once('.') else {
            return Vec::new();
        };
        if ext.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for reg in self.dispatch_order() {
            if reg
                .extensions
                .iter()
                .any(|hint| hint.eq_ignore_ascii_case(ext))
            {
                out.push(Suggestion {
                    score: SCORE_LIKELY,
                    label: reg.label.clone(),
                });
            }
        }
        out
    }

    /// 调度顺序: 优先级降序, 平级按注册顺序
    ///
    /// 顺序不影响语义 (探测函数是纯函数), 但在来源只有部分缓冲时
    /// 影响延迟: 靠后的探测器有机会看到更多字节.
    fn dispatch_order(&self) -> Vec<&Registration> {
        let mut order: Vec<&Registration> = self.entries.iter().collect();
        order.sort_by(|a, b| b.rank.cmp(&a.rank));
        order
    }
}

impl Default for TypeFindRegistry {
    fn default() -> Self {
        Self::new()
    }
}
