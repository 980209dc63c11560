//! 图像格式探测: JPEG、BMP、TIFF.

use shi_core::score::{SCORE_MAX, SCORE_POSSIBLE};
use shi_core::MediaLabel;

use crate::context::TypeFind;

/// JPEG 探测
///
/// SOI 标记后带 JFIF/Exif 标识给满分, 只有 SOI 给"可能".
pub fn jpeg_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 10) else {
        return;
    };
    if data[0] != 0xFF || data[1] != 0xD8 {
        return;
    }
    let label = MediaLabel::new("image/jpeg");
    if &data[6..10] == b"JFIF" || &data[6..10] == b"Exif" {
        tf.suggest(SCORE_MAX, label);
    } else {
        tf.suggest(SCORE_POSSIBLE, label);
    }
}

/// BMP 探测
///
/// `BM` 魔数 + 信息头长度字段必须是已知的三种之一.
pub fn bmp_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 18) else {
        return;
    };
    if &data[0..2] != b"BM" {
        return;
    }
    if matches!(data[14], 0x0C | 0x28 | 0xF0)
        && data[15] == 0
        && data[16] == 0
        && data[17] == 0
    {
        tf.suggest(SCORE_MAX, MediaLabel::new("image/bmp"));
    }
}

/// TIFF 探测: 两种字节序的魔数, 字节序写进标签属性
pub fn tiff_probe(tf: &mut TypeFind<'_>) {
    const LE_HEADER: [u8; 4] = [0x49, 0x49, 0x2A, 0x00];
    const BE_HEADER: [u8; 4] = [0x4D, 0x4D, 0x00, 0x2A];
    let Some(data) = tf.peek(0, 8) else {
        return;
    };
    if data[0..4] == LE_HEADER {
        tf.suggest(
            SCORE_MAX,
            MediaLabel::new("image/tiff").with_str("endianness", "LITTLE_ENDIAN"),
        );
    } else if data[0..4] == BE_HEADER {
        tf.suggest(
            SCORE_MAX,
            MediaLabel::new("image/tiff").with_str("endianness", "BIG_ENDIAN"),
        );
    }
}
