//! 端到端识别流程集成测试.
//!
//! 在内存中构造各种格式的合成字节流, 走完整的
//! 注册表 → 调度 → 探测 → 建议排序 流程.

use shi::core::label::LabelValue;
use shi::core::score::{SCORE_LIKELY, SCORE_MAX, SCORE_MINIMUM};
use shi::probe::MemorySource;

/// 构造一个 MPEG-1 Layer III 帧 (128 kbps, 44100 Hz, 417 字节)
fn build_mp3_frame() -> Vec<u8> {
    let mut frame = vec![0u8; 417];
    frame[0..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
    frame
}

/// 重复 MP3 帧填满至少 `min_len` 字节
fn build_mp3_stream(min_len: usize) -> Vec<u8> {
    let frame = build_mp3_frame();
    let mut data = Vec::new();
    while data.len() < min_len {
        data.extend_from_slice(&frame);
    }
    data
}

/// 构造一个 marker 位齐全的 MPEG-1 pack (12 字节)
fn build_mpeg_pack() -> [u8; 12] {
    [
        0x00, 0x00, 0x01, 0xBA, 0x21, 0x00, 0x01, 0x00, 0x01, 0x80, 0x00, 0x01,
    ]
}

/// 构造含 `matroska` 文档类型的最小 EBML 头
fn build_matroska_header() -> Vec<u8> {
    let mut content = vec![0x42, 0x82, 0x88];
    content.extend_from_slice(b"matroska");
    let mut data = vec![0x1A, 0x45, 0xDF, 0xA3];
    data.push(0x80 | content.len() as u8);
    data.extend_from_slice(&content);
    data
}

#[test]
fn test_识别_mp3_连续帧() {
    let registry = shi::default_registry().unwrap();
    let source = MemorySource::from_data(build_mp3_stream(8 * 1024));
    let best = registry.recognize_best(&source).unwrap();
    assert!(best.score >= SCORE_LIKELY);
    assert_eq!(best.label.name(), "audio/mpeg");
    assert_eq!(best.label.attr("mpegversion"), Some(&LabelValue::Int(1)));
    assert_eq!(best.label.attr("layer"), Some(&LabelValue::Int(3)));
}

#[test]
fn test_识别_mpeg1_系统流() {
    let mut data = Vec::new();
    while data.len() < 32 * 1024 {
        data.extend_from_slice(&build_mpeg_pack());
    }
    let registry = shi::default_registry().unwrap();
    let source = MemorySource::from_data(data);
    let out = registry.recognize(&source);
    // 深扫探测器给出 MAXIMUM-1 的系统流建议
    assert!(out.iter().any(|s| {
        s.score == SCORE_MAX - 1
            && s.label.name() == "video/mpeg"
            && s.label.attr("systemstream") == Some(&LabelValue::Bool(true))
            && s.label.attr("mpegversion") == Some(&LabelValue::Int(1))
    }));
    // 开头 5 字节的快速探测器也认出 MPEG-1 pack
    let best = registry.recognize_best(&source).unwrap();
    assert_eq!(best.label.attr("mpegversion"), Some(&LabelValue::Int(1)));
}

#[test]
fn test_识别_matroska() {
    let registry = shi::default_registry().unwrap();
    let source = MemorySource::from_data(build_matroska_header());
    let best = registry.recognize_best(&source).unwrap();
    assert_eq!(best.score, SCORE_MAX);
    assert_eq!(best.label.name(), "video/x-matroska");
}

#[test]
fn test_识别_tiff_两种字节序() {
    let registry = shi::default_registry().unwrap();

    let mut le = vec![0x49, 0x49, 0x2A, 0x00];
    le.resize(64, 0);
    let best = registry
        .recognize_best(&MemorySource::from_data(le))
        .unwrap();
    assert_eq!(best.score, SCORE_MAX);
    assert_eq!(best.label.name(), "image/tiff");
    assert_eq!(
        best.label.attr("endianness"),
        Some(&LabelValue::Str("LITTLE_ENDIAN".to_string()))
    );

    let mut be = vec![0x4D, 0x4D, 0x00, 0x2A];
    be.resize(64, 0);
    let best = registry
        .recognize_best(&MemorySource::from_data(be))
        .unwrap();
    assert_eq!(
        best.label.attr("endianness"),
        Some(&LabelValue::Str("BIG_ENDIAN".to_string()))
    );
}

#[test]
fn test_识别_smil_压过泛用_xml() {
    let mut data = b"<?xml version=\"1.0\"?>\n<smil></smil>\n".to_vec();
    data.resize(512, b' ');
    let registry = shi::default_registry().unwrap();
    let source = MemorySource::from_data(data);
    let out = registry.recognize(&source);

    assert_eq!(out[0].label.name(), "application/smil");
    assert_eq!(out[0].score, SCORE_MAX);
    assert!(out
        .iter()
        .any(|s| s.label.name() == "application/xml" && s.score == SCORE_MINIMUM));
}

#[test]
fn test_识别_id3_标签下的乱码() {
    // ID3v2 头后面跟的不是音频: 标签探测器满分, MP3 探测器沉默
    let mut data = b"ID3\x04\x00\x00\x00\x00\x00\x00".to_vec();
    for i in 0..2048u32 {
        data.push(0x80 + (i % 0x70) as u8);
    }
    let registry = shi::default_registry().unwrap();
    let source = MemorySource::from_data(data);
    let out = registry.recognize(&source);

    assert_eq!(out[0].label.name(), "application/x-id3");
    assert_eq!(out[0].score, SCORE_MAX);
    assert!(out.iter().all(|s| s.label.name() != "audio/mpeg"));
}

#[test]
fn test_识别_带id3v1标签的mp3不出mp3建议() {
    let mut data = build_mp3_stream(8 * 1024);
    let pos = data.len() - 128;
    data[pos..pos + 3].copy_from_slice(b"TAG");
    let registry = shi::default_registry().unwrap();
    let source = MemorySource::from_data(data);
    let out = registry.recognize(&source);

    // MP3 建议被清零, 剩下 ID3v1 标签建议领跑
    assert!(out.iter().all(|s| s.label.name() != "audio/mpeg"));
    assert_eq!(out[0].label.name(), "application/x-id3");
    assert_eq!(out[0].score, SCORE_MAX - 3);
}

#[test]
fn test_识别_确定性() {
    let registry = shi::default_registry().unwrap();
    let source = MemorySource::from_data(build_mp3_stream(16 * 1024));
    let first = registry.recognize(&source);
    let second = registry.recognize(&source);
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn test_识别_ogg_容器() {
    let mut data = b"OggS\x00\x02".to_vec();
    data.resize(512, 0);
    let registry = shi::default_registry().unwrap();
    let best = registry
        .recognize_best(&MemorySource::from_data(data))
        .unwrap();
    assert_eq!(best.label.name(), "application/ogg");
    assert_eq!(best.score, SCORE_MAX);
}

#[test]
fn test_识别_quicktime_盒链() {
    let mut data = Vec::new();
    data.extend_from_slice(&16u32.to_be_bytes());
    data.extend_from_slice(b"ftypisom");
    data.extend_from_slice(&[0u8; 8]);
    data.extend_from_slice(&24u32.to_be_bytes());
    data.extend_from_slice(b"moov");
    data.extend_from_slice(&[0u8; 16]);
    let registry = shi::default_registry().unwrap();
    let out = registry.recognize(&MemorySource::from_data(data));
    assert!(out
        .iter()
        .any(|s| s.label.name() == "video/quicktime" && s.score == 99));
}
