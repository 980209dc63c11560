//! OGG 容器与常见 OGG 负载的探测.
//!
//! 容器层只看页魔数 `OggS` (Annodex 流在偏移 28 处另有 `fishead\0`);
//! 负载探测器 (Vorbis/Theora/Speex/OGM/Skeleton/CMML) 匹配各自
//! 识别包的包头, 由宿主在拆出的包数据上运行.

use shi_core::score::SCORE_MAX;
use shi_core::MediaLabel;

use crate::context::TypeFind;

/// OGG / Annodex 容器探测
pub fn ogg_probe(tf: &mut TypeFind<'_>) {
    let is_annodex = matches!(tf.peek(28, 8), Some(d) if d == b"fishead\x00");

    let Some(data) = tf.peek(0, 4) else {
        return;
    };
    if data != b"OggS" {
        return;
    }
    if is_annodex {
        tf.suggest(SCORE_MAX, MediaLabel::new("application/x-annodex"));
    }
    tf.suggest(SCORE_MAX, MediaLabel::new("application/ogg"));
}

/// Vorbis 识别包探测
pub fn vorbis_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 30) else {
        return;
    };
    // 1 字节包类型 (0x01) + "vorbis" + 4 字节版本号 (必须为 0)
    if &data[0..11] != b"\x01vorbis\x00\x00\x00\x00" {
        return;
    }
    // 声道数与采样率不能为 0
    if data[11] == 0 {
        return;
    }
    if u32::from_le_bytes([data[12], data[13], data[14], data[15]]) == 0 {
        return;
    }
    // 两个 4 位块尺寸指数: 取值 6..=13 且前者不大于后者
    let blocksize_0 = data[28] & 0x0F;
    let blocksize_1 = (data[28] & 0xF0) >> 4;
    if blocksize_0 > blocksize_1 {
        return;
    }
    if !(6..=13).contains(&blocksize_0) || !(6..=13).contains(&blocksize_1) {
        return;
    }
    // 帧标志位
    if data[29] & 0x01 != 1 {
        return;
    }
    tf.suggest(SCORE_MAX, MediaLabel::new("audio/x-vorbis"));
}

/// Theora 识别包探测
pub fn theora_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 7) else {
        return;
    };
    if data[0] == 0x80 && &data[1..7] == b"theora" {
        tf.suggest(SCORE_MAX, MediaLabel::new("video/x-theora"));
    }
}

/// OGM 视频流头探测
pub fn ogm_video_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 9) else {
        return;
    };
    if data == b"\x01video\x00\x00\x00" {
        tf.suggest(SCORE_MAX, MediaLabel::new("application/x-ogm-video"));
    }
}

/// OGM 音频流头探测
pub fn ogm_audio_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 9) else {
        return;
    };
    if data == b"\x01audio\x00\x00\x00" {
        tf.suggest(SCORE_MAX, MediaLabel::new("application/x-ogm-audio"));
    }
}

/// OGM 文本流头探测
pub fn ogm_text_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 9) else {
        return;
    };
    if data == b"\x01text\x00\x00\x00\x00" {
        tf.suggest(SCORE_MAX, MediaLabel::new("application/x-ogm-text"));
    }
}

/// Speex 头探测
pub fn speex_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 80) else {
        return;
    };
    if &data[0..8] != b"Speex   " {
        return;
    }
    // 头部长度字段至少 80
    if u32::from_le_bytes([data[32], data[33], data[34], data[35]]) < 80 {
        return;
    }
    // 采样率不超过 48000
    if u32::from_le_bytes([data[36], data[37], data[38], data[39]]) > 48000 {
        return;
    }
    // 目前只有 3 种模式
    if u32::from_le_bytes([data[40], data[41], data[42], data[43]]) > 3 {
        return;
    }
    tf.suggest(SCORE_MAX, MediaLabel::new("audio/x-speex"));
}

/// OGG Skeleton (fishead) 头探测
pub fn oggskel_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 12) else {
        return;
    };
    if &data[0..8] != b"fishead\x00" {
        return;
    }
    // 要求版本 3.0
    if u16::from_le_bytes([data[8], data[9]]) != 3 {
        return;
    }
    if u16::from_le_bytes([data[10], data[11]]) != 0 {
        return;
    }
    tf.suggest(
        SCORE_MAX,
        MediaLabel::new("application/x-ogg-skeleton").with_bool("parsed", false),
    );
}

/// CMML 头探测
pub fn cmml_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 12) else {
        return;
    };
    if &data[0..8] != b"CMML\x00\x00\x00\x00" {
        return;
    }
    // 要求至少 2.0 版
    if u16::from_le_bytes([data[8], data[9]]) < 2 {
        return;
    }
    tf.suggest(SCORE_MAX, MediaLabel::new("text/x-cmml"));
}
