//! 字节来源抽象.
//!
//! 识别引擎不做任何 I/O; 它依赖宿主实现的 [`ByteSource`] 按绝对偏移
//! 提供字节窗口. 缓冲策略 (预读多少字节) 完全由宿主决定: 当请求的
//! 窗口尚未缓冲时, 来源返回 `None` 而不是阻塞等待.

use bytes::Bytes;

/// 字节来源 trait
///
/// 约定:
/// - `peek` 要么返回恰好 `length` 字节, 要么返回 `None`; 绝不返回
///   截短或回绕的窗口.
/// - 在一次识别运行内 `peek` 是幂等的: 相同参数必须返回相同数据,
///   探测函数可以依赖这一点.
/// - `length` 对长度未知的流式来源返回 `None`.
pub trait ByteSource {
    /// 按绝对偏移取一段字节窗口
    fn peek(&self, offset: u64, length: usize) -> Option<&[u8]>;

    /// 来源总长度 (如果可知)
    fn length(&self) -> Option<u64>;
}

/// 内存字节来源
///
/// 用于测试和内存中识别, 也可模拟宿主的部分缓冲/流式场景.
pub struct MemorySource {
    /// 数据
    data: Bytes,
    /// 已缓冲的字节数, 超出部分的窗口请求返回 `None`
    available: usize,
    /// 总长度是否可知
    length_known: bool,
}

impl MemorySource {
    /// 从完整数据创建 (全部可用, 长度已知)
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let available = data.len();
        Self {
            data,
            available,
            length_known: true,
        }
    }

    /// 模拟只缓冲了前 `available` 字节的来源
    ///
    /// `length()` 仍报告总长度, 但越过缓冲边界的窗口请求不可用.
    pub fn with_available(data: impl Into<Bytes>, available: usize) -> Self {
        let data = data.into();
        let available = available.min(data.len());
        Self {
            data,
            available,
            length_known: true,
        }
    }

    /// 模拟长度未知的流式来源
    pub fn unknown_length(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let available = data.len();
        Self {
            data,
            available,
            length_known: false,
        }
    }
}

impl ByteSource for MemorySource {
    fn peek(&self, offset: u64, length: usize) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(length)?;
        if end > self.available {
            return None;
        }
        Some(&self.data[start..end])
    }

    fn length(&self) -> Option<u64> {
        self.length_known.then(|| self.data.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_完整来源() {
        let src = MemorySource::from_data(vec![1u8, 2, 3, 4]);
        assert_eq!(src.length(), Some(4));
        assert_eq!(src.peek(1, 2), Some(&[2u8, 3][..]));
        assert_eq!(src.peek(3, 2), None);
    }

    #[test]
    fn test_部分缓冲() {
        let src = MemorySource::with_available(vec![0u8; 100], 10);
        assert_eq!(src.length(), Some(100));
        assert!(src.peek(0, 10).is_some());
        assert!(src.peek(0, 11).is_none());
        assert!(src.peek(50, 1).is_none());
    }

    #[test]
    fn test_长度未知() {
        let src = MemorySource::unknown_length(vec![0u8; 8]);
        assert_eq!(src.length(), None);
        assert!(src.peek(0, 8).is_some());
    }
}
