//! ISO 基媒体容器家族探测: QuickTime/ISO-BMFF、3GPP、M4A.
//!
//! 盒式结构: 每个盒是 `大小(u32 大端) + 类型(4 字节)`;
//! 大小为 1 时其后再跟 8 字节扩展大小.

use shi_core::score::{ProbeScore, SCORE_LIKELY, SCORE_MAX, SCORE_NEARLY_CERTAIN};
use shi_core::MediaLabel;

use crate::context::TypeFind;

/// QuickTime / ISO-BMFF 探测
///
/// 从偏移 0 沿盒链行走: 与 ISO 基媒体格式共有的盒类型逐步抬高
/// 置信度, QuickTime 专有盒直接给满分, 未知盒则放弃整个判断.
pub fn qt_probe(tf: &mut TypeFind<'_>) {
    let mut offset: u64 = 0;
    let mut tip: ProbeScore = 0;

    while let Some(data) = tf.peek(offset as i64, 8) {
        let kind = [data[4], data[5], data[6], data[7]];
        if matches!(&kind, b"moov" | b"mdat" | b"ftyp" | b"free" | b"skip") {
            tip = if tip == 0 {
                SCORE_LIKELY
            } else {
                SCORE_NEARLY_CERTAIN
            };
        } else if matches!(&kind, b"pnot" | b"PICT" | b"wide") {
            tip = SCORE_MAX;
            break;
        } else {
            tip = 0;
            break;
        }

        let mut size = u64::from(u32::from_be_bytes([data[0], data[1], data[2], data[3]]));
        if size == 1 {
            let Some(ext) = tf.peek((offset + 8) as i64, 8) else {
                break;
            };
            size = u64::from_be_bytes([
                ext[0], ext[1], ext[2], ext[3], ext[4], ext[5], ext[6], ext[7],
            ]);
            // 扩展大小至少要装得下 16 字节盒头, 否则链就走不动了
            if size < 16 {
                break;
            }
        } else if size < 8 {
            break;
        }
        offset = match offset.checked_add(size) {
            Some(next) => next,
            None => break,
        };
    }

    if tip > 0 {
        tf.suggest(tip, MediaLabel::new("video/quicktime"));
    }
}

/// 3GPP 探测
///
/// 偏移 4 处要求 `ftyp`; 主品牌是 3gp/3gr/3gs/3gg 之一给满分,
/// 否则在 ftyp 盒的兼容品牌槽里继续找, 找到给"大概率".
pub fn q3gp_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 12) else {
        return;
    };
    if &data[4..8] != b"ftyp" {
        return;
    }

    let brand = [data[8], data[9], data[10]];
    if matches!(&brand, b"3gp" | b"3gr" | b"3gs" | b"3gg") {
        tf.suggest(SCORE_MAX, MediaLabel::new("application/x-3gp"));
        return;
    }

    let ftyp_size = u64::from(u32::from_be_bytes([data[0], data[1], data[2], data[3]]));
    let mut offset: u64 = 16;
    while offset < ftyp_size {
        let Some(slot) = tf.peek(offset as i64, 3) else {
            break;
        };
        let slot = [slot[0], slot[1], slot[2]];
        if matches!(&slot, b"3gp" | b"3gr" | b"3gs" | b"3gg") {
            tf.suggest(SCORE_LIKELY, MediaLabel::new("application/x-3gp"));
            break;
        }
        offset += 4;
    }
}

/// M4A 探测: `ftyp` + 品牌 `M4A ` 或 `mp42`
pub fn m4a_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(4, 8) else {
        return;
    };
    if data == b"ftypM4A " || data == b"ftypmp42" {
        tf.suggest(SCORE_MAX, MediaLabel::new("audio/x-m4a"));
    }
}
