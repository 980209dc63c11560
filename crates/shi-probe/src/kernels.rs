//! 通用探测内核.
//!
//! 大量格式只需要"起始字节等于某个魔数"或"RIFF 容器 + 表单标签"
//! 一类的固定检查. 这两个内核各实现一次, 具体格式在注册表里以数据
//! 形式给出参数, 不再为每个格式单写函数.

use shi_core::score::{ProbeScore, SCORE_MAX};
use shi_core::MediaLabel;

use crate::context::TypeFind;

/// 起始魔数内核: 开头 `magic.len()` 字节与魔数完全相等时汇报建议
pub fn starts_with(tf: &mut TypeFind<'_>, magic: &[u8], score: ProbeScore, label: &MediaLabel) {
    let Some(data) = tf.peek(0, magic.len()) else {
        return;
    };
    if data == magic {
        tf.suggest(score, label.clone());
    }
}

/// RIFF 表单内核: 要求 0..4 为 `"RIFF"` 且 8..12 为表单标签
pub fn riff(tf: &mut TypeFind<'_>, form: &[u8; 4], label: &MediaLabel) {
    let Some(data) = tf.peek(0, 12) else {
        return;
    };
    if &data[0..4] == b"RIFF" && &data[8..12] == form {
        tf.suggest(SCORE_MAX, label.clone());
    }
}
