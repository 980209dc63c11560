//! 档案与可执行文件探测: TAR、AR、MS-DOS/PE.
//!
//! 给档案类偏高的分数: 宁可把整个档案识别出来, 也别让里面的成员
//! 文件被各自的探测器认走 (比如 tar 包里的 mp3).

use shi_core::score::{SCORE_NEARLY_CERTAIN, SCORE_POSSIBLE};
use shi_core::MediaLabel;

use crate::context::TypeFind;

/// TAR 探测: 魔数在第 257 字节
pub fn tar_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(257, 8) else {
        return;
    };
    // 旧 GNU 格式: "ustar  " + NUL
    if data == b"ustar  \x00" {
        tf.suggest(SCORE_NEARLY_CERTAIN, MediaLabel::new("application/x-tar"));
        return;
    }
    // POSIX 格式: "ustar" + NUL + 两位版本号数字
    if &data[0..6] == b"ustar\x00" && data[6].is_ascii_digit() && data[7].is_ascii_digit() {
        tf.suggest(SCORE_NEARLY_CERTAIN, MediaLabel::new("application/x-tar"));
    }
}

/// AR 档案探测
///
/// `!<arch>` 之后的 17 字节应当全部是可打印 ASCII 或换行
/// (第一个成员头的文件名区); 不满足时降为"可能".
pub fn ar_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 24) else {
        return;
    };
    if &data[0..7] != b"!<arch>" {
        return;
    }
    let clean = data[7..24]
        .iter()
        .all(|&b| (0x20..0x7F).contains(&b) || b == b'\n');
    let score = if clean {
        SCORE_NEARLY_CERTAIN
    } else {
        SCORE_POSSIBLE
    };
    tf.suggest(score, MediaLabel::new("application/x-ar"));
}

/// MS-DOS / PE 可执行文件探测
///
/// `MZ` 头 + 重定位表偏移 4, 再沿第 60 字节处的指针找 `PE` 头.
pub fn msdos_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 64) else {
        return;
    };
    if data[0] != b'M' || data[1] != b'Z' {
        return;
    }
    if u16::from_le_bytes([data[8], data[9]]) != 4 {
        return;
    }
    let pe_offset = u32::from_le_bytes([data[60], data[61], data[62], data[63]]);
    let Some(pe) = tf.peek(i64::from(pe_offset), 2) else {
        return;
    };
    if pe == b"PE" {
        tf.suggest(
            SCORE_NEARLY_CERTAIN,
            MediaLabel::new("application/x-ms-dos-executable"),
        );
    }
}
