//! 杂项音频格式探测.
//!
//! 大多是固定偏移的魔数检查; WavPack 需要沿子块链走到第一个位流
//! 子块才知道是正常流还是校正流.

use log::debug;
use shi_core::score::{SCORE_LIKELY, SCORE_MAX, SCORE_POSSIBLE};
use shi_core::MediaLabel;

use crate::context::TypeFind;

/// AIFF / AIFC 探测: `FORM` 容器 + 表单类型
pub fn aiff_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 12) else {
        return;
    };
    if &data[0..4] != b"FORM" {
        return;
    }
    if &data[8..12] == b"AIFF" || &data[8..12] == b"AIFC" {
        tf.suggest(SCORE_MAX, MediaLabel::new("audio/x-aiff"));
    }
}

/// 8SVX / 16SV 探测: `FORM` 容器 + 表单类型
pub fn svx_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 12) else {
        return;
    };
    if &data[0..4] != b"FORM" {
        return;
    }
    if &data[8..12] == b"8SVX" || &data[8..12] == b"16SV" {
        tf.suggest(SCORE_MAX, MediaLabel::new("audio/x-svx"));
    }
}

/// Shorten 探测: 头部魔数, 或追加模式留在文件尾部的标记
pub fn shn_probe(tf: &mut TypeFind<'_>) {
    if let Some(data) = tf.peek(0, 4) {
        if data == b"ajkg" {
            tf.suggest(SCORE_MAX, MediaLabel::new("audio/x-shorten"));
        }
    }
    if let Some(data) = tf.peek(-8, 8) {
        if data == b"SHNAMPSK" {
            tf.suggest(SCORE_MAX, MediaLabel::new("audio/x-shorten"));
        }
    }
}

/// Monkey's Audio 探测
pub fn ape_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 4) else {
        return;
    };
    if data == b"MAC " {
        // 比满分低一点, 让 ID3/APE 标签探测器优先接手带标签的文件
        tf.suggest(SCORE_LIKELY + 10, MediaLabel::new("application/x-ape"));
    }
}

/// TTA 探测
pub fn tta_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 3) else {
        return;
    };
    if data == b"TTA" {
        tf.suggest(SCORE_MAX, MediaLabel::new("audio/x-ttafile"));
    }
}

/// AC-3 探测: 只有 16 位同步字, 给分很保守
pub fn ac3_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 2) else {
        return;
    };
    if data[0] == 0x0B && data[1] == 0x77 {
        tf.suggest(SCORE_POSSIBLE, MediaLabel::new("audio/x-ac3"));
    }
}

/// AU / SND 探测 (两种字节序的魔数)
pub fn au_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 4) else {
        return;
    };
    if data == b".snd" || data == b"dns." {
        tf.suggest(SCORE_MAX, MediaLabel::new("audio/x-au"));
    }
}

/// Ensoniq PARIS 探测 (两种字节序的魔数)
pub fn paris_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 4) else {
        return;
    };
    if data == b" paf" || data == b"fap " {
        tf.suggest(SCORE_MAX, MediaLabel::new("audio/x-paris"));
    }
}

/// iLBC 探测
pub fn ilbc_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, 8) else {
        return;
    };
    if data == b"#!iLBC30" || data == b"#!iLBC20" {
        tf.suggest(SCORE_LIKELY, MediaLabel::new("audio/iLBC-sh"));
    }
}

/// MIDI 采样转储 (SDS) 探测: 带掩码的 4 字节魔数
pub fn sds_probe(tf: &mut TypeFind<'_>) {
    const MASK: [u8; 4] = [0xFF, 0xFF, 0x80, 0xFF];
    const MATCH: [u8; 4] = [0xF0, 0x7E, 0x00, 0x01];
    let Some(data) = tf.peek(0, 4) else {
        return;
    };
    for i in 0..4 {
        if data[i] & MASK[i] != MATCH[i] {
            return;
        }
    }
    tf.suggest(SCORE_MAX, MediaLabel::new("audio/x-sds"));
}

/// IRCAM 探测: 带掩码的 4 字节魔数
pub fn ircam_probe(tf: &mut TypeFind<'_>) {
    const MASK: [u8; 4] = [0xFF, 0xFF, 0xF8, 0xFF];
    const MATCH: [u8; 4] = [0x64, 0xA3, 0x00, 0x00];
    let Some(data) = tf.peek(0, 4) else {
        return;
    };
    for i in 0..4 {
        if data[i] & MASK[i] != MATCH[i] {
            return;
        }
    }
    tf.suggest(SCORE_MAX, MediaLabel::new("audio/x-ircam"));
}

/// WavPack 探测
///
/// 块头 `wvpk` + 32 位小端块大小; 沿子块链找第一个位流子块,
/// 其 id 低半字节区分正常流 (0xA/0xC) 与校正流 (0xB).
pub fn wavpack_probe(tf: &mut TypeFind<'_>) {
    let Some(head) = tf.peek(0, 32) else {
        return;
    };
    if &head[0..4] != b"wvpk" {
        return;
    }
    debug!("WavPack: 发现块头");

    // 块可能大过宿主愿意缓冲的上限; 取不到整块就按 3/4 缩小重试,
    // 指望只解析拿得到的那部分
    let mut block_size = u32::from_le_bytes([head[4], head[5], head[6], head[7]]) as usize;
    let data = loop {
        if let Some(data) = tf.peek(0, 32 + block_size) {
            break data;
        }
        if 32 + block_size < 512 {
            return;
        }
        block_size = block_size * 3 / 4;
    };

    let body = &data[32..];
    let mut pos = 0usize;
    let mut left = block_size as i64;
    while left > 2 {
        if pos + 2 > body.len() {
            return;
        }
        let id = body[pos];
        let mut sub_len = usize::from(body[pos + 1]) << 1;
        if id & 0x80 != 0 {
            // 大子块: 3 字节长度
            if pos + 4 > body.len() {
                return;
            }
            sub_len |= usize::from(body[pos + 2]) << 9 | usize::from(body[pos + 3]) << 17;
            sub_len += 1 + 3;
        } else {
            sub_len += 1 + 1;
        }
        if sub_len > block_size {
            return;
        }
        if id & 0x20 == 0 {
            match id & 0x0F {
                0x0A | 0x0C => {
                    tf.suggest(
                        SCORE_LIKELY,
                        MediaLabel::new("audio/x-wavpack").with_bool("framed", false),
                    );
                    return;
                }
                0x0B => {
                    tf.suggest(
                        SCORE_LIKELY,
                        MediaLabel::new("audio/x-wavpack-correction").with_bool("framed", false),
                    );
                    return;
                }
                _ => {}
            }
        }
        left -= sub_len as i64;
        pos += sub_len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn probe_one(data: Vec<u8>, probe: fn(&mut TypeFind<'_>)) -> Option<String> {
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        probe(&mut tf);
        tf.best().map(|s| s.label.name().to_string())
    }

    #[test]
    fn test_form_容器类() {
        let mut aiff = b"FORM".to_vec();
        aiff.extend_from_slice(&100u32.to_be_bytes());
        aiff.extend_from_slice(b"AIFF");
        assert_eq!(probe_one(aiff, aiff_probe).as_deref(), Some("audio/x-aiff"));

        let mut svx = b"FORM".to_vec();
        svx.extend_from_slice(&100u32.to_be_bytes());
        svx.extend_from_slice(b"8SVX");
        assert_eq!(probe_one(svx, svx_probe).as_deref(), Some("audio/x-svx"));

        let mut wave = b"FORM".to_vec();
        wave.extend_from_slice(&100u32.to_be_bytes());
        wave.extend_from_slice(b"WAVE");
        assert_eq!(probe_one(wave, aiff_probe), None);
    }

    #[test]
    fn test_shorten_尾部标记() {
        let mut data = vec![0u8; 64];
        let pos = data.len() - 8;
        data[pos..].copy_from_slice(b"SHNAMPSK");
        assert_eq!(probe_one(data, shn_probe).as_deref(), Some("audio/x-shorten"));
    }

    #[test]
    fn test_简单魔数类() {
        assert_eq!(
            probe_one(b"MAC \x96\x0F".to_vec(), ape_probe).as_deref(),
            Some("application/x-ape")
        );
        assert_eq!(
            probe_one(b"TTA1".to_vec(), tta_probe).as_deref(),
            Some("audio/x-ttafile")
        );
        assert_eq!(
            probe_one(vec![0x0B, 0x77, 0x12], ac3_probe).as_deref(),
            Some("audio/x-ac3")
        );
        assert_eq!(
            probe_one(b".snd\x00\x00\x00\x18".to_vec(), au_probe).as_deref(),
            Some("audio/x-au")
        );
        assert_eq!(
            probe_one(b" paf\x00".to_vec(), paris_probe).as_deref(),
            Some("audio/x-paris")
        );
        assert_eq!(
            probe_one(b"#!iLBC30\n".to_vec(), ilbc_probe).as_deref(),
            Some("audio/iLBC-sh")
        );
    }

    #[test]
    fn test_掩码魔数类() {
        assert_eq!(
            probe_one(vec![0xF0, 0x7E, 0x42, 0x01], sds_probe).as_deref(),
            Some("audio/x-sds")
        );
        assert_eq!(
            probe_one(vec![0x64, 0xA3, 0x04, 0x00], ircam_probe).as_deref(),
            Some("audio/x-ircam")
        );
        assert_eq!(probe_one(vec![0x64, 0xA3, 0x08, 0x00], ircam_probe), None);
    }

    /// 构造一个 WavPack 块: 头 32 字节 + 子块
    fn build_wavpack(bitstream_id: u8) -> Vec<u8> {
        let mut body = Vec::new();
        // 先放一个无关小子块 (id 0x21, 长度 2)
        body.extend_from_slice(&[0x21, 0x01, 0xAA, 0xBB]);
        // 位流子块 (小子块, 长度 4)
        body.extend_from_slice(&[bitstream_id, 0x02, 0x01, 0x02, 0x03, 0x04]);

        let mut data = b"wvpk".to_vec();
        data.extend_from_slice(&(body.len() as u32).to_le_bytes());
        data.resize(32, 0);
        data.extend_from_slice(&body);
        data
    }

    #[test]
    fn test_wavpack_正常流() {
        assert_eq!(
            probe_one(build_wavpack(0x0A), wavpack_probe).as_deref(),
            Some("audio/x-wavpack")
        );
    }

    #[test]
    fn test_wavpack_校正流() {
        assert_eq!(
            probe_one(build_wavpack(0x0B), wavpack_probe).as_deref(),
            Some("audio/x-wavpack-correction")
        );
    }

    #[test]
    fn test_wavpack_元数据位跳过() {
        // id 带 0x20 位: 不是位流子块, 链走完也没有建议
        assert_eq!(probe_one(build_wavpack(0x2A), wavpack_probe), None);
    }
}
