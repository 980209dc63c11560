//! 文本类探测: UTF-8 纯文本、URI 列表、XML 及其特化 (SMIL).

use log::debug;
use shi_core::score::{average_score, ProbeScore, SCORE_MAX, SCORE_MINIMUM, SCORE_POSSIBLE};
use shi_core::MediaLabel;

use crate::context::{Cursor, TypeFind};

/// XML 声明扫描的窗口尺寸
const XML_CHUNK: usize = 256;

/// URI 列表扫描的窗口尺寸
const URI_CHUNK: usize = 16;

/// 检查来源是否以 XML 声明开头, 并核对第一个普通元素
///
/// `element` 为 `None` 时任何元素名都算通过 (泛用 XML);
/// 为 `Some(名称)` 时要求首个普通元素名完全等于该名称.
pub(crate) fn xml_check_first_element(tf: &TypeFind<'_>, element: Option<&str>) -> bool {
    // XML 声明见 XML 规范 2.8 "Prolog and Document Type Declaration"
    let Some(head) = tf.peek(0, XML_CHUNK) else {
        return false;
    };
    if &head[0..5] != b"<?xml" {
        return false;
    }

    let Some(mut cur) = Cursor::new(tf, 0, XML_CHUNK) else {
        return false;
    };
    for _ in 0..5 {
        if !cur.advance(tf) {
            return false;
        }
    }

    // 找第一个普通元素; <?… 和 <!… 是处理指令或声明, 跳过
    loop {
        while cur.current() != b'<' {
            if !cur.advance(tf) {
                return false;
            }
        }
        if !cur.advance(tf) {
            return false;
        }
        if !cur.current().is_ascii_alphabetic() {
            if !cur.advance(tf) {
                return false;
            }
            continue;
        }
        let Some(name) = element else {
            return true;
        };
        let Some(data) = tf.peek(cur.offset() as i64, name.len() + 1) else {
            return false;
        };
        // 名称须完全相等: 其后紧跟的字节不能还是名称字符
        return &data[..name.len()] == name.as_bytes()
            && !data[name.len()].is_ascii_alphanumeric();
    }
}

/// 泛用 XML 探测: 只认 XML 声明, 给最低分, 把机会留给特化探测器
pub fn xml_probe(tf: &mut TypeFind<'_>) {
    if xml_check_first_element(tf, None) {
        tf.suggest(SCORE_MINIMUM, MediaLabel::new("application/xml"));
    }
}

/// SMIL 探测: XML 声明 + 根元素 `smil`
pub fn smil_probe(tf: &mut TypeFind<'_>) {
    if xml_check_first_element(tf, Some("smil")) {
        tf.suggest(SCORE_MAX, MediaLabel::new("application/smil"));
    }
}

/// 窗口是否是合法 UTF-8
///
/// 容忍窗口末尾 4 字节内被截断的多字节序列.
fn utf8_window_valid(window: &[u8]) -> bool {
    match std::str::from_utf8(window) {
        Ok(_) => true,
        Err(err) => err.valid_up_to() + 4 > window.len(),
    }
}

/// 在指定偏移处评估 UTF-8 合法性
///
/// 从 32 KiB 窗口起步, 取不到就折半收缩 (下限 16 字节), 每收缩一次
/// 起始分数 95 递减 10.
fn utf8_score_at(tf: &TypeFind<'_>, offset: u64) -> Option<ProbeScore> {
    let min_size = 16;
    let step = 10;
    let mut size = 32 * 1024;
    let mut score: ProbeScore = 95;

    while score > step && size > min_size {
        if let Some(window) = tf.peek(offset as i64, size) {
            return utf8_window_valid(window).then_some(score);
        }
        size /= 2;
        score -= step;
    }
    None
}

/// UTF-8 纯文本探测
pub fn utf8_probe(tf: &mut TypeFind<'_>) {
    // XML 留给 XML 探测器, 避免把 XML 认成纯文本
    if xml_check_first_element(tf, None) {
        return;
    }

    let Some(start_score) = utf8_score_at(tf, 0) else {
        return;
    };
    debug!("UTF-8: 开头是纯文本 (分数 {start_score})");

    let label = MediaLabel::new("text/plain");

    // 长度未知或为零时摸不到文件中部, 最高只给"可能"
    let length = match tf.length() {
        None | Some(0) => {
            tf.suggest(start_score.min(SCORE_POSSIBLE), label);
            return;
        }
        Some(len) => len,
    };

    if length < 64 * 1024 {
        tf.suggest(start_score, label);
        return;
    }

    // 再看文件中部, 两处分数取平均
    let Some(mid_score) = utf8_score_at(tf, length / 2) else {
        return;
    };
    debug!("UTF-8: 中部也是纯文本 (分数 {mid_score})");
    tf.suggest(average_score(start_score, mid_score), label);
}

/// URI 列表探测
///
/// 跳过 `#` 开头的注释行后, 要求若干 ASCII 字母数字组成的方案名,
/// 其后紧跟 `://`.
pub fn uri_probe(tf: &mut TypeFind<'_>) {
    let Some(mut cur) = Cursor::new(tf, 0, URI_CHUNK) else {
        return;
    };

    // 整行跳过注释
    while cur.current() == b'#' {
        while cur.current() != b'\n' {
            if !cur.advance(tf) {
                return;
            }
        }
        if !cur.advance(tf) {
            return;
        }
    }

    if !cur.current().is_ascii_alphabetic() {
        return;
    }
    if !cur.advance(tf) {
        return;
    }
    while cur.current().is_ascii_alphanumeric() {
        if !cur.advance(tf) {
            return;
        }
    }
    if cur.current() != b':' {
        return;
    }

    // 方案名之后必须是 "//"
    let Some(data) = tf.peek(cur.offset() as i64, 3) else {
        return;
    };
    if &data[1..3] != b"//" {
        return;
    }
    tf.suggest(SCORE_MAX, MediaLabel::new("text/uri-list"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    /// 把文本补齐到至少 `len` 字节 (XML 扫描需要完整的 256 字节窗口)
    fn padded(text: &str, len: usize) -> Vec<u8> {
        let mut data = text.as_bytes().to_vec();
        while data.len() < len {
            data.push(b' ');
        }
        data
    }

    #[test]
    fn test_xml_首元素匹配() {
        let data = padded("<?xml version=\"1.0\"?>\n<!-- c -->\n<smil></smil>", 300);
        let src = MemorySource::from_data(data);
        let tf = TypeFind::new(&src);
        assert!(xml_check_first_element(&tf, None));
        assert!(xml_check_first_element(&tf, Some("smil")));
        assert!(!xml_check_first_element(&tf, Some("svg")));
    }

    #[test]
    fn test_xml_元素名必须完全相等() {
        let data = padded("<?xml version=\"1.0\"?><smiley/>", 300);
        let src = MemorySource::from_data(data);
        let tf = TypeFind::new(&src);
        assert!(!xml_check_first_element(&tf, Some("smil")));
    }

    #[test]
    fn test_smil_与泛用_xml() {
        let data = padded("<?xml version=\"1.0\"?><smil></smil>", 300);
        let src = MemorySource::from_data(data);

        let mut tf = TypeFind::new(&src);
        smil_probe(&mut tf);
        assert_eq!(tf.best().unwrap().score, SCORE_MAX);

        let mut tf = TypeFind::new(&src);
        xml_probe(&mut tf);
        let best = tf.best().unwrap();
        assert_eq!(best.score, SCORE_MINIMUM);
        assert_eq!(best.label.name(), "application/xml");
    }

    #[test]
    fn test_utf8_小文件() {
        // 128 字节是收缩窗口的下限之一, 小于它探测不到
        let data = padded("你好, 世界. hello world.", 200);
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        utf8_probe(&mut tf);
        let best = tf.best().unwrap();
        assert_eq!(best.label.name(), "text/plain");
        assert!(best.score > 0);
    }

    #[test]
    fn test_utf8_拒绝二进制() {
        let mut data = vec![0xFFu8, 0xFE, 0x00, 0x80];
        data.extend_from_slice(&padded("", 200));
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        utf8_probe(&mut tf);
        assert!(tf.best().is_none());
    }

    #[test]
    fn test_utf8_长度未知时封顶() {
        // 开头 32 KiB 全部合法, 起始分数 95, 但长度未知只能给到"可能"
        let src = MemorySource::unknown_length(padded("plain text here", 40 * 1024));
        let mut tf = TypeFind::new(&src);
        utf8_probe(&mut tf);
        assert_eq!(tf.best().unwrap().score, SCORE_POSSIBLE);
    }

    #[test]
    fn test_utf8_不抢_xml() {
        let data = padded("<?xml version=\"1.0\"?><doc/>", 300);
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        utf8_probe(&mut tf);
        assert!(tf.best().is_none());
    }

    #[test]
    fn test_uri_列表() {
        let data = b"# comment line\nhttp://example.com/a.mp3\n".to_vec();
        let src = MemorySource::from_data(data);
        let mut tf = TypeFind::new(&src);
        uri_probe(&mut tf);
        let best = tf.best().unwrap();
        assert_eq!(best.score, SCORE_MAX);
        assert_eq!(best.label.name(), "text/uri-list");
    }

    #[test]
    fn test_uri_方案名后必须是双斜杠() {
        let src = MemorySource::from_data(b"mailto:someone@example.com\n".to_vec());
        let mut tf = TypeFind::new(&src);
        uri_probe(&mut tf);
        assert!(tf.best().is_none());
    }

    #[test]
    fn test_uri_非字母开头() {
        let src = MemorySource::from_data(b"1234://nope.example.com/\n".to_vec());
        let mut tf = TypeFind::new(&src);
        uri_probe(&mut tf);
        assert!(tf.best().is_none());
    }
}
