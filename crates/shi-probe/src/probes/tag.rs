//! 元数据标签探测: ID3v2/ID3v1 与 APE 标签.
//!
//! 标签探测器的优先级高于音频格式探测器: 带标签的文件应先被标签
//! 剥离组件接手, 否则标签里的任意字节可能被误认成别的格式.

use shi_core::score::SCORE_MAX;
use shi_core::MediaLabel;

use crate::context::TypeFind;

/// ID3 标签探测
///
/// ID3v2 在文件开头, 头部 10 字节; ID3v1 固定在文件末尾 128 字节处.
pub fn id3_probe(tf: &mut TypeFind<'_>) {
    if let Some(data) = tf.peek(0, 10) {
        // ID3v2: 版本字节不能是 0xFF, 同步安全尺寸的 4 字节高位必须为 0
        if &data[0..3] == b"ID3"
            && data[3] != 0xFF
            && data[4] != 0xFF
            && data[6] & 0x80 == 0
            && data[7] & 0x80 == 0
            && data[8] & 0x80 == 0
            && data[9] & 0x80 == 0
        {
            tf.suggest(SCORE_MAX, MediaLabel::new("application/x-id3"));
            return;
        }
    }
    if let Some(data) = tf.peek(-128, 3) {
        if data == b"TAG" {
            tf.suggest(SCORE_MAX - 3, MediaLabel::new("application/x-id3"));
        }
    }
}

/// APE 标签探测
///
/// APEv1/v2 可以在文件开头, 也可以在末尾 32 字节处 (尾标签).
pub fn apetag_probe(tf: &mut TypeFind<'_>) {
    if let Some(data) = tf.peek(0, 8) {
        if data == b"APETAGEX" {
            tf.suggest(SCORE_MAX - 1, MediaLabel::new("application/x-apetag"));
            return;
        }
    }
    if let Some(data) = tf.peek(-32, 8) {
        if data == b"APETAGEX" {
            tf.suggest(SCORE_MAX - 2, MediaLabel::new("application/x-apetag"));
        }
    }
}
