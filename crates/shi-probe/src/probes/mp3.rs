//! MPEG-1 音频 (MP3) 探测.
//!
//! 帧头结构 (32 位):
//! ```text
//! AAAA AAAA  AAAB BCCD  EEEE FFGH  IIJJ KLMM
//! A = 同步位 (11 bit, 全1)   B = MPEG 版本    C = 层
//! D = CRC 保护              E = 比特率索引    F = 采样率索引
//! G = 填充位                H = 私有位        I = 声道模式
//! J = 模式扩展              K = 版权         L = 原始/复制
//! M = 强调
//! ```
//!
//! 随机数据恰好凑出一个合法帧头的概率约为 0.024%, 因此单个帧头不足
//! 为凭: 从每个同步点出发按帧长跳跃, 连续解出多个帧头才算命中.
//! 比特率字段为 0 的"自由格式"帧长写在流里推不出来, 只能记住第一个
//! 候选, 等遇到第二个候选时用两者间距当帧长回头重试.

use log::{debug, trace, warn};
use shi_core::score::{
    average_score, ProbeScore, SCORE_LIKELY, SCORE_MAX, SCORE_MINIMUM, SCORE_POSSIBLE,
};
use shi_core::MediaLabel;

use crate::context::TypeFind;

/// 来源耗尽时最少需要的连续帧头数
const MIN_HEADERS: u32 = 2;

/// 目标连续帧头数
const TRY_HEADERS: u32 = 5;

/// 同步搜索上限 (字节)
const TRY_SYNC: u64 = 10_000;

/// 同步搜索窗口尺寸
const SYNC_CHUNK: usize = 2048;

/// 比特率表 (kbps): [MPEG-1 | MPEG-2/2.5][层 - 1][索引]
const BITRATES: [[[u32; 16]; 3]; 2] = [
    [
        [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0],
        [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0],
        [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0],
    ],
    [
        [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0],
        [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
        [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
    ],
];

/// 采样率表: [版本][索引]
const SAMPLE_RATES: [[u32; 3]; 3] = [
    [11025, 12000, 8000],
    [22050, 24000, 16000],
    [44100, 48000, 32000],
];

/// 一个解析成功的帧头
struct FrameInfo {
    /// 帧总长 (字节)
    length: u32,
    /// 层 (1..=3)
    layer: u32,
    /// 声道数
    channels: u32,
    /// 采样率 (Hz)
    samplerate: u32,
}

/// 帧头判定结果
enum HeaderCheck {
    /// 合法帧头
    Valid(FrameInfo),
    /// 不是帧头
    Invalid,
    /// 比特率字段为 0 且帧长未知: 可能是自由格式
    PossiblyFree,
}

/// 从 32 位帧头计算帧长与流属性
///
/// `free_frame_len` 是自由格式帧长备忘: 为 `Some` 时比特率为 0 的
/// 帧头按该长度成帧, 为 `None` 时报告 [`HeaderCheck::PossiblyFree`].
fn check_header(header: u32, free_frame_len: Option<u32>) -> HeaderCheck {
    if header & 0xFFE0_0000 != 0xFFE0_0000 {
        return HeaderCheck::Invalid;
    }

    // 模式扩展/版权/原始/强调位与帧长无关
    let mut h = header >> 6;
    let mode = h & 0x3;
    h >>= 3;
    let padding = h & 0x1;
    h >>= 1;

    let sr_idx = (h & 0x3) as usize;
    if sr_idx == 3 {
        return HeaderCheck::Invalid;
    }
    h >>= 2;

    let br_idx = (h & 0xF) as usize;
    if br_idx == 15 {
        return HeaderCheck::Invalid;
    }
    if br_idx == 0 && free_frame_len.is_none() {
        trace!("MP3: 可能是自由格式帧");
        return HeaderCheck::PossiblyFree;
    }
    // CRC 位也不参与帧长
    h >>= 5;

    let layer = 4 - (h & 0x3);
    if layer == 4 {
        return HeaderCheck::Invalid;
    }
    h >>= 2;

    // 版本: 0=MPEG-2.5, 2=MPEG-2, 3=MPEG-1 (1 保留)
    let version = h & 0x3;
    if version == 1 {
        return HeaderCheck::Invalid;
    }

    let channels = if mode == 3 { 1 } else { 2 };
    let samplerate =
        SAMPLE_RATES[if version > 0 { version as usize - 1 } else { 0 }][sr_idx];

    let length = if br_idx == 0 {
        // 自由格式: 帧长来自两个同步点的间距
        let free_len = free_frame_len.unwrap_or(0);
        if layer == 1 {
            padding * 4 + free_len
        } else {
            padding + free_len
        }
    } else {
        let bitrate = BITRATES[if version == 3 { 0 } else { 1 }][(layer - 1) as usize][br_idx];
        if layer == 1 {
            (12000 * bitrate / samplerate + padding) * 4
        } else {
            let factor = if layer == 3 && version != 3 { 72000 } else { 144000 };
            padding + factor * bitrate / samplerate
        }
    };
    if length == 0 {
        return HeaderCheck::Invalid;
    }

    HeaderCheck::Valid(FrameInfo {
        length,
        layer,
        channels,
        samplerate,
    })
}

/// 在 `start` 起的区域内搜索连续帧头
///
/// 返回 (层, 分数); 分数为 0 表示没有命中. 状态机: 逐字节找 0xFF
/// 同步候选; 每个候选沿帧长走出最多 [`TRY_HEADERS`] 个帧头, 层/采样
/// 率/声道中途变化的帧头不计数; 候选失败则回到逐字节搜索.
/// 走到来源尽头时凑满 [`MIN_HEADERS`] 个也算成功.
fn find_at_offset(tf: &TypeFind<'_>, start: u64) -> (u32, ProbeScore) {
    let mut window: &[u8] = &[];
    let mut win_pos = 0usize;
    let mut skipped: u64 = 0;
    let mut last_free_offset: Option<u64> = None;
    let mut last_free_len: Option<u32> = None;

    while skipped < TRY_SYNC {
        if win_pos >= window.len() {
            // 尾部不足整窗时收缩重试
            let mut size = SYNC_CHUNK;
            let mut next = tf.peek((start + skipped) as i64, size);
            while next.is_none() && size > 10 {
                size /= 2;
                next = tf.peek((start + skipped) as i64, size);
            }
            match next {
                Some(w) => {
                    window = w;
                    win_pos = 0;
                }
                None => break,
            }
        }

        if window[win_pos] == 0xFF {
            let mut offset = skipped;
            let mut found = 0u32;
            let mut layer = 0u32;
            let mut exhausted = false;
            let mut prev: Option<(u32, u32, u32)> = None;

            while found < TRY_HEADERS {
                // 帧头 4 字节: 还在当前窗口里就直接取, 否则重新 peek
                let rel = offset as i64 - skipped as i64 + win_pos as i64;
                let head = if rel >= 0 && rel as usize + 4 <= window.len() {
                    let i = rel as usize;
                    u32::from_be_bytes([window[i], window[i + 1], window[i + 2], window[i + 3]])
                } else {
                    match tf.peek((start + offset) as i64, 4) {
                        Some(b) => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
                        None => {
                            exhausted = true;
                            break;
                        }
                    }
                };

                match check_header(head, last_free_len) {
                    HeaderCheck::Valid(info) => {
                        match prev {
                            Some((pl, ps, pc))
                                if pl != info.layer
                                    || ps != info.samplerate
                                    || pc != info.channels =>
                            {
                                // 属性中途变化: 这个帧头不算数, 但继续沿帧长走
                                // (比特率不在此列, VBR 是合法的)
                                prev = Some((info.layer, info.samplerate, info.channels));
                            }
                            _ => {
                                prev = Some((info.layer, info.samplerate, info.channels));
                                found += 1;
                                layer = info.layer;
                                trace!("MP3: 第 {found} 个帧头, 偏移 {}", start + offset);
                            }
                        }
                        offset += u64::from(info.length);
                    }
                    HeaderCheck::PossiblyFree => {
                        match last_free_offset {
                            Some(first) if offset > first => {
                                // 第二个自由格式候选: 间距即帧长, 回到第一个重试
                                last_free_len = Some((offset - first) as u32);
                                offset = first;
                                continue;
                            }
                            _ => {
                                last_free_offset = Some(offset);
                                break;
                            }
                        }
                    }
                    HeaderCheck::Invalid => {
                        last_free_len = None;
                        break;
                    }
                }
            }

            if found == TRY_HEADERS || (found >= MIN_HEADERS && exhausted) {
                let mut score = (u64::from(found) * u64::from(SCORE_MAX)
                    * (TRY_SYNC - skipped)
                    / u64::from(TRY_HEADERS)
                    / TRY_SYNC) as ProbeScore;
                score = score.max(SCORE_MINIMUM);
                if start > 0 {
                    score /= 2;
                }
                debug!(
                    "MP3: 偏移 {start} 处命中 {found} 个帧头 (跳过 {skipped} 字节), 分数 {score}"
                );
                // 结尾是 ID3v1 标签的话把机会让给标签探测器
                match tf.peek(-128, 3) {
                    None => score = score * 4 / 5,
                    Some(tag) if tag == b"TAG" => score = 0,
                    Some(_) => {}
                }
                if score > 0 {
                    return (layer, score);
                }
                return (0, 0);
            }
        }

        win_pos += 1;
        skipped += 1;
    }

    (0, 0)
}

fn suggest_mp3(tf: &mut TypeFind<'_>, layer: u32, score: ProbeScore) {
    tf.suggest(
        score,
        MediaLabel::new("audio/mpeg")
            .with_int("mpegversion", 1)
            .with_int("layer", i64::from(layer)),
    );
}

/// MPEG-1 音频探测
///
/// 在文件开头与中部各扫一遍 (开头已经足够确定时省去第二遍);
/// 两遍层一致时取平均分, 不一致则放弃.
pub fn mp3_probe(tf: &mut TypeFind<'_>) {
    let (mut layer, mut score) = find_at_offset(tf, 0);

    let length = match tf.length() {
        None | Some(0) => {
            if score != 0 {
                suggest_mp3(tf, layer, score);
            }
            return;
        }
        Some(len) => len,
    };

    if score >= SCORE_LIKELY {
        suggest_mp3(tf, layer, score);
        return;
    }

    let (mid_layer, mid_score) = find_at_offset(tf, length / 2);
    if mid_score > 0 {
        if score == 0 {
            debug!("MP3: 只在文件中部探测到 MPEG 音频 (分数 {mid_score})");
            suggest_mp3(tf, mid_layer, mid_score);
        } else if layer != mid_layer {
            warn!("MP3: 开头与中部的层不一致: {layer} vs {mid_layer}");
        } else {
            suggest_mp3(tf, layer, average_score(score, mid_score));
        }
        return;
    }

    // 中部没有命中: 开头恰好是一个合法帧头也能给个保守分.
    // 结尾带 ID3v1 标签的流除外, 那是标签探测器的地盘.
    let tagged = matches!(tf.peek(-128, 3), Some(tag) if tag == b"TAG");
    if !tagged {
        if let Some(head) = tf.peek(0, 4) {
            let head = u32::from_be_bytes([head[0], head[1], head[2], head[3]]);
            if let HeaderCheck::Valid(info) = check_header(head, Some(0)) {
                layer = info.layer;
                score = if score == 0 {
                    SCORE_POSSIBLE - 10
                } else {
                    (SCORE_POSSIBLE - 10).max(score + 10)
                };
            }
        }
    }
    if score > 0 {
        suggest_mp3(tf, layer, score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use shi_core::label::LabelValue;

    /// 构造 MPEG-1 Layer III 帧头 (同步 + 版本 + 层 + 无 CRC = 0xFFFB)
    fn frame_header(bitrate_idx: u32, sr_idx: u32, padding: bool) -> [u8; 4] {
        let mut h: u32 = 0xFFFB_0000;
        h |= (bitrate_idx & 0x0F) << 12;
        h |= (sr_idx & 0x03) << 10;
        if padding {
            h |= 1 << 9;
        }
        h.to_be_bytes()
    }

    /// 构造一个完整的帧 (头部 + 零填充)
    fn build_frame(bitrate_idx: u32, sr_idx: u32) -> Vec<u8> {
        let header = frame_header(bitrate_idx, sr_idx, false);
        let info = match check_header(u32::from_be_bytes(header), None) {
            HeaderCheck::Valid(info) => info,
            _ => panic!("测试帧头应当合法"),
        };
        let mut frame = vec![0u8; info.length as usize];
        frame[0..4].copy_from_slice(&header);
        frame
    }

    /// 重复帧填满至少 `min_len` 字节
    fn build_stream(min_len: usize) -> Vec<u8> {
        let frame = build_frame(9, 0); // 128 kbps, 44100 Hz, 417 字节
        let mut data = Vec::new();
        while data.len() < min_len {
            data.extend_from_slice(&frame);
        }
        data
    }

    #[test]
    fn test_帧头解析_128kbps_44100() {
        let header = u32::from_be_bytes(frame_header(9, 0, false));
        let info = match check_header(header, None) {
            HeaderCheck::Valid(info) => info,
            _ => panic!("应当解析成功"),
        };
        assert_eq!(info.layer, 3);
        assert_eq!(info.samplerate, 44100);
        assert_eq!(info.channels, 2);
        // 144000 * 128 / 44100 = 417
        assert_eq!(info.length, 417);
    }

    #[test]
    fn test_帧头解析_保留值被拒() {
        // 采样率索引 3 保留
        assert!(matches!(
            check_header(u32::from_be_bytes(frame_header(9, 3, false)), None),
            HeaderCheck::Invalid
        ));
        // 比特率索引 15 保留
        assert!(matches!(
            check_header(u32::from_be_bytes(frame_header(15, 0, false)), None),
            HeaderCheck::Invalid
        ));
        // 同步位不对
        assert!(matches!(
            check_header(0x1234_5678, None),
            HeaderCheck::Invalid
        ));
    }

    #[test]
    fn test_帧头解析_自由格式() {
        let header = u32::from_be_bytes(frame_header(0, 0, false));
        assert!(matches!(
            check_header(header, None),
            HeaderCheck::PossiblyFree
        ));
        // 帧长备忘给定后按备忘成帧
        match check_header(header, Some(417)) {
            HeaderCheck::Valid(info) => assert_eq!(info.length, 417),
            _ => panic!("备忘帧长应当可用"),
        }
    }

    #[test]
    fn test_探测_连续帧流() {
        let data = build_stream(8 * 1024);
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        mp3_probe(&mut tf);
        let best = tf.best().unwrap();
        assert!(best.score >= SCORE_LIKELY);
        assert_eq!(best.label.name(), "audio/mpeg");
        assert_eq!(best.label.attr("mpegversion"), Some(&LabelValue::Int(1)));
        assert_eq!(best.label.attr("layer"), Some(&LabelValue::Int(3)));
    }

    #[test]
    fn test_探测_id3v1_尾标签清零() {
        let mut data = build_stream(8 * 1024);
        let tag_pos = data.len() - 128;
        data[tag_pos..tag_pos + 3].copy_from_slice(b"TAG");
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        mp3_probe(&mut tf);
        assert!(tf.best().is_none());
    }

    #[test]
    fn test_探测_长文件两遍平均() {
        // 开头混入垃圾前缀压低第一遍分数, 逼出中部的第二遍扫描;
        // 两遍层一致, 结果是两遍分数的平均
        let mut data = vec![0xAAu8; 3000];
        data.extend_from_slice(&build_stream(128 * 1024));
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        mp3_probe(&mut tf);
        let best = tf.best().unwrap();
        assert!(best.score >= SCORE_POSSIBLE && best.score < SCORE_LIKELY);
        assert_eq!(best.label.attr("layer"), Some(&LabelValue::Int(3)));
    }

    #[test]
    fn test_探测_纯随机数据无建议() {
        let data: Vec<u8> = (0..8192u32).map(|i| (i * 7 + 3) as u8).collect();
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        mp3_probe(&mut tf);
        assert!(tf.best().is_none());
    }
}
