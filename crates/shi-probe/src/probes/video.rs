//! 杂项视频格式探测: FLI/FLC 动画、DV、Shockwave Flash.

use shi_core::score::{SCORE_LIKELY, SCORE_MAX};
use shi_core::MediaLabel;

use crate::context::TypeFind;

/// FLI/FLC 动画探测
///
/// 拿得到 134 字节时顺带校验第一帧的帧类型; 拿不到就只看魔数,
/// 分数降为"大概率".
pub fn flx_probe(tf: &mut TypeFind<'_>) {
    if let Some(data) = tf.peek(0, 134) {
        if matches!(data[4], 0x11 | 0x12 | 0x30 | 0x44)
            && data[5] == 0xAF
            && (data[132] == 0x00 || data[132] == 0xFA)
            && data[133] == 0xF1
        {
            tf.suggest(SCORE_MAX, MediaLabel::new("video/x-fli"));
        }
        return;
    }
    if let Some(data) = tf.peek(0, 6) {
        if matches!(data[4], 0x11 | 0x12 | 0x30 | 0x44) && data[5] == 0xAF {
            tf.suggest(SCORE_LIKELY, MediaLabel::new("video/x-fli"));
        }
    }
}

/// DV 探测
///
/// 前 5 字节是 DIF 块标识; 第 4 字节的最高位区分 PAL 与 NTSC.
pub fn dv_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 5) else {
        return;
    };
    if data[0] != 0x1F || data[1] != 0x07 || data[2] != 0x00 || data[4] & 0x01 != 0 {
        return;
    }
    let format = if data[3] & 0x80 != 0 { "PAL" } else { "NTSC" };
    tf.suggest(
        SCORE_MAX,
        MediaLabel::new("video/x-dv")
            .with_bool("systemstream", true)
            .with_str("format", format),
    );
}

/// Shockwave Flash 探测 (`FWS` 未压缩 / `CWS` 压缩)
pub fn swf_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 4) else {
        return;
    };
    if (data[0] == b'F' || data[0] == b'C') && data[1] == b'W' && data[2] == b'S' {
        tf.suggest(SCORE_MAX, MediaLabel::new("application/x-shockwave-flash"));
    }
}
