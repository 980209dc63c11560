//! 探测上下文.
//!
//! [`TypeFind`] 是传给每个探测函数的对象, 捆绑了三件事:
//! 字节窗口访问 (带符号偏移的 `peek`)、长度查询、建议汇报 (`suggest`).
//! 探测函数是 `(上下文) -> ()` 的纯函数, 不跨调用保留状态;
//! 借出的字节窗口只在单次探测调用内有效.

use log::trace;
use shi_core::score::{clamp_score, ProbeScore, SCORE_MAX, SCORE_NONE};
use shi_core::MediaLabel;

use crate::registry::ProbeRank;
use crate::source::ByteSource;

/// 一条识别建议: (置信度, 标签)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// 置信度分数, 恒在 `[1, 100]` 内
    pub score: ProbeScore,
    /// 媒体类型标签
    pub label: MediaLabel,
}

/// 运行内部记录的建议, 附带排序用的注册优先级与插入序号
struct Recorded {
    score: ProbeScore,
    label: MediaLabel,
    rank: ProbeRank,
    seq: u32,
}

/// 探测上下文
pub struct TypeFind<'src> {
    source: &'src dyn ByteSource,
    entries: Vec<Recorded>,
    current_rank: ProbeRank,
}

impl<'src> TypeFind<'src> {
    /// 为一次识别运行创建上下文
    pub fn new(source: &'src dyn ByteSource) -> Self {
        Self {
            source,
            entries: Vec::new(),
            current_rank: 0,
        }
    }

    /// 取一段字节窗口
    ///
    /// 负偏移从来源末尾倒数: `peek(-128, 3)` 请求末尾前 128 字节处的
    /// 3 个字节. 末尾相对偏移仅在来源长度已知时有效; 长度未知不等同于
    /// 偏移被拒绝, 二者都以 `None` 表达但探测函数可用 [`Self::length`]
    /// 区分. 以下情况均返回 `None`:
    /// - 来源尚未缓冲所请求的区间
    /// - 偏移越界, 或已知长度放不下该窗口
    pub fn peek(&self, offset: i64, length: usize) -> Option<&'src [u8]> {
        let source = self.source;
        let abs = if offset < 0 {
            let total = source.length()?;
            let back = offset.unsigned_abs();
            if back > total {
                return None;
            }
            total - back
        } else {
            offset as u64
        };
        if let Some(total) = source.length() {
            if (length as u64) > total || abs > total - length as u64 {
                return None;
            }
        }
        let window = source.peek(abs, length)?;
        // 来源返回不足量窗口视为不可用, 绝不让探测函数拿到截短数据
        if window.len() != length {
            return None;
        }
        Some(window)
    }

    /// 来源总长度 (如果可知)
    pub fn length(&self) -> Option<u64> {
        self.source.length()
    }

    /// 汇报一条建议
    ///
    /// 零分建议被静默丢弃; 非零分数在记录前收敛到 `[1, 100]`.
    /// 同一探测函数的多条建议按汇报顺序保留.
    pub fn suggest(&mut self, score: ProbeScore, label: MediaLabel) {
        if score == SCORE_NONE {
            return;
        }
        let score = clamp_score(score);
        trace!("typefind: 建议 {label} (分数 {score})");
        let seq = self.entries.len() as u32;
        self.entries.push(Recorded {
            score,
            label,
            rank: self.current_rank,
            seq,
        });
    }

    /// 当前最优建议: 分数最高者, 平分时先比注册优先级再比插入顺序
    pub fn best(&self) -> Option<Suggestion> {
        let mut best: Option<&Recorded> = None;
        for entry in &self.entries {
            let better = match best {
                None => true,
                Some(b) => {
                    entry.score > b.score
                        || (entry.score == b.score && entry.rank > b.rank)
                        || (entry.score == b.score && entry.rank == b.rank && entry.seq < b.seq)
                }
            };
            if better {
                best = Some(entry);
            }
        }
        best.map(|e| Suggestion {
            score: e.score,
            label: e.label.clone(),
        })
    }

    /// 运行中是否已出现满分建议
    pub(crate) fn has_max(&self) -> bool {
        self.entries.iter().any(|e| e.score == SCORE_MAX)
    }

    pub(crate) fn set_current_rank(&mut self, rank: ProbeRank) {
        self.current_rank = rank;
    }

    /// 结束运行, 产出排好序的建议列表
    ///
    /// 排序键: 分数降序, 注册优先级降序, 插入顺序升序.
    pub(crate) fn into_ranked(self) -> Vec<Suggestion> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(b.rank.cmp(&a.rank))
                .then(a.seq.cmp(&b.seq))
        });
        entries
            .into_iter()
            .map(|e| Suggestion {
                score: e.score,
                label: e.label,
            })
            .collect()
    }
}

/// 滚动窗口游标
///
/// 供逐字节扫描型探测函数使用: 游标持有当前窗口和它在来源中的绝对
/// 基准偏移, 前进越过窗口末尾时通过 `peek` 取下一个定长窗口续上;
/// 取不到时前进失败, 调用方就地放弃. 窗口边界因此永远不会被越过.
pub struct Cursor<'src> {
    window: &'src [u8],
    base: u64,
    pos: usize,
    chunk: usize,
}

impl<'src> Cursor<'src> {
    /// 在 `start` 处建立游标, 窗口定长 `chunk` 字节
    pub fn new(tf: &TypeFind<'src>, start: u64, chunk: usize) -> Option<Self> {
        debug_assert!(chunk > 0);
        let window = tf.peek(start as i64, chunk)?;
        Some(Self {
            window,
            base: start,
            pos: 0,
            chunk,
        })
    }

    /// 当前字节
    pub fn current(&self) -> u8 {
        self.window[self.pos]
    }

    /// 当前字节在来源中的绝对偏移
    pub fn offset(&self) -> u64 {
        self.base + self.pos as u64
    }

    /// 前进一个字节, 必要时换入下一个窗口; 数据不可用时返回 `false`
    pub fn advance(&mut self, tf: &TypeFind<'src>) -> bool {
        self.pos += 1;
        if self.pos == self.window.len() {
            let base = self.base + self.window.len() as u64;
            match tf.peek(base as i64, self.chunk) {
                Some(window) => {
                    self.window = window;
                    self.base = base;
                    self.pos = 0;
                }
                None => {
                    self.pos -= 1;
                    return false;
                }
            }
        }
        true
    }
}
