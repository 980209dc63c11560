//! Matroska (EBML) 探测.
//!
//! EBML 用变长整数编码元素大小:
//! ```text
//! 首字节的前导 0 个数决定总宽度:
//!   1xxxxxxx          → 1 字节 (7 位数据)
//!   01xxxxxx xxxxxxxx → 2 字节 (14 位数据)
//!   ...依此类推, 最多 8 字节
//! ```
//! 这里不完整解析 EBML 头, 只解出头部大小后在其中搜索文档类型
//! 字符串 `matroska` —— 不算滴水不漏, 但足够可靠.

use shi_core::score::SCORE_MAX;
use shi_core::MediaLabel;

use crate::context::TypeFind;

/// EBML 头元素魔数
const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Matroska 探测
pub fn matroska_probe(tf: &mut TypeFind<'_>) {
    // 4 字节 EBML 魔数 + 1 字节大小前缀
    let Some(data) = tf.peek(0, 5) else {
        return;
    };
    if data[0..4] != EBML_MAGIC {
        return;
    }

    // 变长整数宽度
    let first = data[4];
    if first == 0 {
        return;
    }
    let width = first.leading_zeros() as usize + 1;

    // 取完整的变长整数, 掩掉前导标记位
    let Some(data) = tf.peek(0, 4 + width) else {
        return;
    };
    let mut size = u64::from(first & (0xFFu16 >> width) as u8);
    for i in 1..width {
        size = (size << 8) | u64::from(data[4 + i]);
    }

    // 取完整 EBML 头, 在其中搜索文档类型
    let Some(total) = (4 + width as u64)
        .checked_add(size)
        .and_then(|t| usize::try_from(t).ok())
    else {
        return;
    };
    let Some(data) = tf.peek(0, total) else {
        return;
    };
    let header = &data[4 + width..];
    if header.windows(8).any(|w| w == b"matroska") {
        tf.suggest(SCORE_MAX, MediaLabel::new("video/x-matroska"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    /// 构造最小的 EBML 头: 魔数 + 1 字节大小 + 含 DocType 的内容
    fn build_ebml_header(doc_type: &str) -> Vec<u8> {
        let mut content = Vec::new();
        // DocType 元素 (ID 0x4282) + 大小 + 字符串
        content.push(0x42);
        content.push(0x82);
        content.push(0x80 | doc_type.len() as u8);
        content.extend_from_slice(doc_type.as_bytes());

        let mut data = EBML_MAGIC.to_vec();
        data.push(0x80 | content.len() as u8); // 1 字节变长大小
        data.extend_from_slice(&content);
        data
    }

    #[test]
    fn test_探测_matroska() {
        let src = MemorySource::from_data(build_ebml_header("matroska"));
        let mut tf = TypeFind::new(&src);
        matroska_probe(&mut tf);
        let best = tf.best().unwrap();
        assert_eq!(best.score, SCORE_MAX);
        assert_eq!(best.label.name(), "video/x-matroska");
    }

    #[test]
    fn test_文档类型不是_matroska() {
        let src = MemorySource::from_data(build_ebml_header("webmfile"));
        let mut tf = TypeFind::new(&src);
        matroska_probe(&mut tf);
        assert!(tf.best().is_none());
    }

    #[test]
    fn test_多字节变长大小() {
        let mut content = Vec::new();
        content.push(0x42);
        content.push(0x82);
        content.push(0x88);
        content.extend_from_slice(b"matroska");
        content.resize(300, 0);

        let mut data = EBML_MAGIC.to_vec();
        // 2 字节变长: 01xxxxxx xxxxxxxx
        data.push(0x40 | ((content.len() >> 8) as u8));
        data.push((content.len() & 0xFF) as u8);
        data.extend_from_slice(&content);
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        matroska_probe(&mut tf);
        assert_eq!(tf.best().unwrap().score, SCORE_MAX);
    }

    #[test]
    fn test_头部被截断时沉默() {
        let mut data = build_ebml_header("matroska");
        data.truncate(8);
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        matroska_probe(&mut tf);
        assert!(tf.best().is_none());
    }
}
