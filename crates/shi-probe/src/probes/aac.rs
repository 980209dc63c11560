//! AAC (ADTS / ADIF) 探测.
//!
//! ADIF 头是 4 字节字面量, 直接认. ADTS 同步字只有 14 位 (`0xFFF` +
//! 版本位 + 层位), 太短不足为凭: 解出帧长后要求下一帧起点也有合法
//! 同步字 (合计 28 位) 才算数. 帧一般只有 200-400 字节, 4 KiB 窗口
//! 足够容下两帧.

use log::debug;
use shi_core::score::SCORE_LIKELY;
use shi_core::MediaLabel;

use crate::context::TypeFind;

/// 扫描窗口尺寸
const SCAN: usize = 4096;

fn adts_label(mpegversion: i64) -> MediaLabel {
    MediaLabel::new("audio/mpeg")
        .with_bool("framed", false)
        .with_int("mpegversion", mpegversion)
}

/// AAC 探测
pub fn aac_probe(tf: &mut TypeFind<'_>) {
    let Some(data) = tf.peek(0, SCAN) else {
        return;
    };

    let mut n = 0usize;
    while n + 4 <= SCAN {
        let sync = u16::from_be_bytes([data[n], data[n + 1]]);
        if sync & 0xFFF6 == 0xFFF0 {
            debug!("AAC: 偏移 {n:#x} 处发现 ADTS 同步点, 追踪下一帧");
            if n + 6 > SCAN {
                debug!("AAC: 窗口不足以解析 ADTS 头");
                break;
            }
            let len = (usize::from(data[n + 3] & 0x03) << 11)
                | (usize::from(data[n + 4]) << 3)
                | (usize::from(data[n + 5] & 0xE0) >> 5);
            if n + len + 2 > SCAN {
                debug!("AAC: 下一帧超出窗口");
                break;
            }
            if len == 0 {
                n += 1;
                continue;
            }

            let next = u16::from_be_bytes([data[n + len], data[n + len + 1]]);
            if next & 0xFFF6 == 0xFFF0 {
                let mpegversion = if data[n + 1] & 0x08 != 0 { 2 } else { 4 };
                debug!("AAC: ADTS-{mpegversion} 同步点在 {n:#x} (帧长 {len})");
                tf.suggest(SCORE_LIKELY, adts_label(mpegversion));
                return;
            }
            debug!("AAC: {:#x} 处没有下一帧", n + len);
        } else if &data[n..n + 4] == b"ADIF" {
            tf.suggest(SCORE_LIKELY, adts_label(4));
            return;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use shi_core::label::LabelValue;

    /// 构造一个 ADTS 帧: MPEG-4, 帧长 `len`
    fn adts_frame(len: usize) -> Vec<u8> {
        let mut frame = vec![0u8; len];
        frame[0] = 0xFF;
        frame[1] = 0xF1; // MPEG-4, layer 0, 无 CRC
        frame[2] = 0x50;
        // 13 位帧长分布在第 3..6 字节
        frame[3] = ((len >> 11) & 0x03) as u8;
        frame[4] = ((len >> 3) & 0xFF) as u8;
        frame[5] = ((len & 0x07) as u8) << 5 | 0x1F;
        frame
    }

    #[test]
    fn test_探测_adts_双同步() {
        let mut data = adts_frame(256);
        data.extend_from_slice(&adts_frame(256));
        data.resize(SCAN, 0);
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        aac_probe(&mut tf);
        let best = tf.best().unwrap();
        assert_eq!(best.score, SCORE_LIKELY);
        assert_eq!(best.label.attr("mpegversion"), Some(&LabelValue::Int(4)));
        assert_eq!(best.label.attr("framed"), Some(&LabelValue::Bool(false)));
    }

    #[test]
    fn test_探测_单同步不算数() {
        // 只有一帧, 帧长指向的位置没有第二个同步字
        let mut data = adts_frame(256);
        data.resize(SCAN, 0);
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        aac_probe(&mut tf);
        assert!(tf.best().is_none());
    }

    #[test]
    fn test_探测_adif() {
        let mut data = vec![0u8; 64];
        data.extend_from_slice(b"ADIF");
        data.resize(SCAN, 0);
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        aac_probe(&mut tf);
        assert_eq!(
            tf.best().unwrap().label.attr("mpegversion"),
            Some(&LabelValue::Int(4))
        );
    }

    #[test]
    fn test_探测_mpeg2_版本位() {
        let mut frame = adts_frame(256);
        frame[1] |= 0x08; // MPEG-2 版本位
        let mut data = frame.clone();
        data.extend_from_slice(&frame);
        data.resize(SCAN, 0);
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        aac_probe(&mut tf);
        assert_eq!(
            tf.best().unwrap().label.attr("mpegversion"),
            Some(&LabelValue::Int(2))
        );
    }

    #[test]
    fn test_窗口不足四千字节时沉默() {
        let mut data = adts_frame(256);
        data.extend_from_slice(&adts_frame(256));
        // 只有 512 字节, 凑不齐 4 KiB 扫描窗口
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        aac_probe(&mut tf);
        assert!(tf.best().is_none());
    }
}
