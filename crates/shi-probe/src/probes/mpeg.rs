//! MPEG 系统流与视频基本流探测.
//!
//! 系统流深扫与 MP3 探测同一个思路: 单个起始码 (32 位) 不足为凭,
//! 从每个候选出发按包长连续走出多个合法包头才算命中.

use log::debug;
use shi_core::score::SCORE_MAX;
use shi_core::MediaLabel;

use crate::context::TypeFind;

/// 连续包头数目标
const TRY_HEADERS: u32 = 4;

/// 同步搜索上限 (字节)
const TRY_SYNC: u64 = 100 * 1024;

/// 同步搜索窗口尺寸
const SYNC_CHUNK: usize = 2048;

/// 深扫需要的连续图像数
const TRY_PICTURES: u32 = 6;

fn sys_label(mpegversion: i64) -> MediaLabel {
    MediaLabel::new("video/mpeg")
        .with_bool("systemstream", true)
        .with_int("mpegversion", mpegversion)
}

fn video_label(mpegversion: i64) -> MediaLabel {
    MediaLabel::new("video/mpeg")
        .with_bool("systemstream", false)
        .with_int("mpegversion", mpegversion)
}

/// pack 起始码 `00 00 01 BA`
fn is_pack_start(d: &[u8]) -> bool {
    d[0] == 0x00 && d[1] == 0x00 && d[2] == 0x01 && d[3] == 0xBA
}

/// PES 起始码 (视频/音频/私有流)
fn is_pes_start(d: &[u8]) -> bool {
    d[0] == 0x00
        && d[1] == 0x00
        && d[2] == 0x01
        && (d[3] == 0xE0 || d[3] == 0xC0 || d[3] == 0xBD)
}

/// 包头解析结果
enum PacketSize {
    /// 不是合法包头
    Invalid,
    /// 数据不足
    NeedData,
    /// 合法, 包总长为给定字节数
    Size(u64),
}

/// 解析 `offset` 处的 MPEG-1 系统流包头, 返回包长
fn mpeg1_packet_size(tf: &TypeFind<'_>, offset: u64) -> PacketSize {
    let Some(data) = tf.peek(offset as i64, 4) else {
        return PacketSize::NeedData;
    };
    if data[0] != 0x00 || data[1] != 0x00 || data[2] != 0x01 {
        return PacketSize::Invalid;
    }
    let body = offset + 4;

    match data[3] {
        // pack 头: 固定 12 字节, 校验 marker 位
        0xBA => {
            let Some(d) = tf.peek(body as i64, 8) else {
                return PacketSize::NeedData;
            };
            if d[0] & 0xF1 != 0x21
                || d[2] & 0x01 != 0x01
                || d[4] & 0x01 != 0x01
                || d[5] & 0x80 != 0x80
                || d[7] & 0x01 != 0x01
            {
                return PacketSize::Invalid;
            }
            PacketSize::Size(12)
        }

        // ISO 结束码
        0xB9 => PacketSize::Size(4),

        // system 头: 6 + 大端 u16 长度, 校验头部与流表项的 marker 位
        0xBB => {
            let Some(d) = tf.peek(body as i64, 2) else {
                return PacketSize::NeedData;
            };
            let size = u64::from(u16::from_be_bytes([d[0], d[1]])) + 6;
            if size < 12 {
                return PacketSize::Invalid;
            }
            let Some(d) = tf.peek((body + 2) as i64, (size - 6) as usize) else {
                return PacketSize::NeedData;
            };
            if d[0] & 0x80 != 0x80 || d[2] & 0x01 != 0x01 || d[4] & 0x20 != 0x20 {
                return PacketSize::Invalid;
            }
            // 每个 3 字节流表项: 流号 > 0xBB 且后随 marker 位 11
            let mut i = 6usize;
            while i + 1 < d.len() {
                if d[i] <= 0xBB || d[i + 1] & 0xC0 != 0xC0 {
                    return PacketSize::Invalid;
                }
                i += 3;
            }
            PacketSize::Size(size)
        }

        // 0xB9 以下不是合法的流号
        kind if kind < 0xB9 => PacketSize::Invalid,

        // 其余包: 6 + 大端 u16 长度
        _ => {
            let Some(d) = tf.peek(body as i64, 2) else {
                return PacketSize::NeedData;
            };
            PacketSize::Size(u64::from(u16::from_be_bytes([d[0], d[1]])) + 6)
        }
    }
}

/// MPEG-1 系统流深扫
///
/// 最多搜索 100 KiB 找 pack 起始码; 每个候选连续走出
/// [`TRY_HEADERS`] 个合法包 (或来源耗尽前至少一个) 即命中.
pub fn mpeg1_sys_probe(tf: &mut TypeFind<'_>) {
    let mut window: &[u8] = &[];
    let mut win_pos = 0usize;
    let mut skipped: u64 = 0;

    while skipped < TRY_SYNC {
        if win_pos + 4 > window.len() {
            match tf.peek(skipped as i64, SYNC_CHUNK) {
                Some(w) => {
                    window = w;
                    win_pos = 0;
                }
                None => break,
            }
        }

        if is_pack_start(&window[win_pos..]) {
            let mut found = 0u32;
            let mut offset = skipped;
            let mut exhausted = false;
            while found < TRY_HEADERS {
                match mpeg1_packet_size(tf, offset) {
                    PacketSize::Invalid => break,
                    PacketSize::NeedData => {
                        exhausted = true;
                        break;
                    }
                    PacketSize::Size(size) => {
                        offset += size;
                        found += 1;
                    }
                }
            }
            if found == TRY_HEADERS || (found >= 1 && exhausted) {
                debug!("MPEG: 偏移 {skipped} 起连续 {found} 个系统流包");
                tf.suggest(SCORE_MAX - 1, sys_label(1));
                return;
            }
        }

        win_pos += 1;
        skipped += 1;
    }
}

/// MPEG-2 系统流探测 (只看开头 5 字节)
pub fn mpeg2_sys_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 5) else {
        return;
    };
    if is_pack_start(data) {
        if data[4] & 0xC0 == 0x40 {
            // MPEG-2 pack: '01' 前缀
            tf.suggest(SCORE_MAX, sys_label(2));
        } else if data[4] & 0xF0 == 0x20 {
            // MPEG-1 pack: '0010' 前缀
            tf.suggest(SCORE_MAX, sys_label(1));
        }
    } else if is_pes_start(data) {
        tf.suggest(SCORE_MAX, sys_label(2));
    }
}

/// MPEG 视频基本流探测 (序列头前缀)
pub fn mpeg_video_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 4) else {
        return;
    };
    if data == [0x00, 0x00, 0x01, 0xB3] {
        tf.suggest(SCORE_MAX - 1, video_label(1));
    }
}

/// MPEG 视频基本流深扫
///
/// 接受序列头/GOP 头后跟图像头与切片头的组合, 凑满
/// [`TRY_PICTURES`] 幅图像即命中.
pub fn mpeg_video_stream_probe(tf: &mut TypeFind<'_>) {
    let mut window: &[u8] = &[];
    let mut pos = 0usize;
    let mut skipped: u64 = 0;
    let mut found = 0u32;

    loop {
        if found >= TRY_PICTURES {
            debug!("MPEG: 深扫命中 {found} 幅图像");
            tf.suggest(SCORE_MAX - 2, video_label(1));
            return;
        }
        if skipped > TRY_SYNC {
            return;
        }
        if pos + 5 > window.len() {
            match tf.peek(skipped as i64, SYNC_CHUNK) {
                Some(w) => {
                    window = w;
                    pos = 0;
                }
                None => return,
            }
        }

        let d = &window[pos..];
        if d[0] == 0x00 && d[1] == 0x00 && d[2] == 0x01 && (d[3] == 0xB3 || d[3] == 0xB8) {
            // 序列头 / GOP 头: 跳过, 之后应出现图像头
            pos += 8;
            skipped += 8;
            continue;
        }
        if d[0] == 0x00 && d[1] == 0x00 && d[2] == 0x01 && d[3] == 0x00 {
            // 图像头: 其后 8 字节内应出现切片起始码 (允许错位一个字节)
            pos += 8;
            skipped += 8;
            if pos + 5 > window.len() {
                match tf.peek(skipped as i64, SYNC_CHUNK) {
                    Some(w) => {
                        window = w;
                        pos = 0;
                    }
                    None => return,
                }
            }
            let s = &window[pos..];
            if (s[0] == 0x00 && s[1] == 0x00 && s[2] == 0x01 && s[3] == 0x01)
                || (s[1] == 0x00 && s[2] == 0x00 && s[3] == 0x01 && s[4] == 0x01)
            {
                pos += 4;
                skipped += 4;
                found += 1;
            }
            continue;
        }

        pos += 1;
        skipped += 1;
    }
}

/// MPEG-4 视频基本流探测
///
/// 视频对象起始码后跟视频对象层起始码, 末字节在 0x20..=0x2F.
pub fn mpeg4_video_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 8) else {
        return;
    };
    if data[0..7] == [0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01]
        && (0x20..=0x2F).contains(&data[7])
    {
        tf.suggest(SCORE_MAX - 1, video_label(4));
    }
}
