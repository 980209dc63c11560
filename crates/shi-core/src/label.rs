//! 媒体类型标签.
//!
//! 标签是一个值对象: 主名称 (如 `audio/mpeg`) 加上有序的属性列表.
//! 识别引擎从不解读标签内容, 只负责原样传递给宿主管线;
//! 相等性为结构相等 (含属性顺序).
//!
//! 标签有一种文本形式, 供数据驱动的注册表使用:
//! ```text
//! audio/mpeg, mpegversion=1, layer=[1,3]
//! video/mpeg, systemstream=true
//! image/tiff, endianness=LITTLE_ENDIAN
//! ```

use std::fmt;

use crate::error::{ShiError, ShiResult};

/// 标签属性值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelValue {
    /// 整数
    Int(i64),
    /// 布尔
    Bool(bool),
    /// 字符串
    Str(String),
    /// 整数闭区间 `[min, max]`
    IntRange(i64, i64),
}

impl fmt::Display for LabelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelValue::Int(v) => write!(f, "{v}"),
            LabelValue::Bool(v) => write!(f, "{v}"),
            LabelValue::Str(v) => write!(f, "{v}"),
            LabelValue::IntRange(min, max) => write!(f, "[{min},{max}]"),
        }
    }
}

/// 媒体类型标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLabel {
    /// 主名称
    name: String,
    /// 有序属性列表
    attrs: Vec<(String, LabelValue)>,
}

impl MediaLabel {
    /// 创建只有主名称的标签
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    /// 追加整数属性
    pub fn with_int(mut self, key: impl Into<String>, value: i64) -> Self {
        self.attrs.push((key.into(), LabelValue::Int(value)));
        self
    }

    /// 追加布尔属性
    pub fn with_bool(mut self, key: impl Into<String>, value: bool) -> Self {
        self.attrs.push((key.into(), LabelValue::Bool(value)));
        self
    }

    /// 追加字符串属性
    pub fn with_str(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), LabelValue::Str(value.into())));
        self
    }

    /// 追加整数区间属性
    pub fn with_range(mut self, key: impl Into<String>, min: i64, max: i64) -> Self {
        self.attrs.push((key.into(), LabelValue::IntRange(min, max)));
        self
    }

    /// 主名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 属性列表 (按追加顺序)
    pub fn attrs(&self) -> &[(String, LabelValue)] {
        &self.attrs
    }

    /// 按键查找属性值
    pub fn attr(&self, key: &str) -> Option<&LabelValue> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// 从文本形式解析标签
    ///
    /// 文本形式为 `名称` 或 `名称, 键=值, 键=值`; 值可以是整数、
    /// `true`/`false`、`[min,max]` 区间, 其余按字符串处理.
    pub fn parse(text: &str) -> ShiResult<MediaLabel> {
        let mut segments = split_segments(text);
        let name = segments
            .next()
            .map(str::trim)
            .filter(|n| !n.is_empty() && !n.contains('='))
            .ok_or_else(|| ShiError::InvalidLabel(text.to_string()))?;

        let mut label = MediaLabel::new(name);
        for seg in segments {
            let seg = seg.trim();
            let (key, value) = seg
                .split_once('=')
                .ok_or_else(|| ShiError::InvalidLabel(text.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ShiError::InvalidLabel(text.to_string()));
            }
            let value = parse_value(value.trim())
                .ok_or_else(|| ShiError::InvalidLabel(text.to_string()))?;
            label.attrs.push((key.to_string(), value));
        }
        Ok(label)
    }
}

impl fmt::Display for MediaLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (key, value) in &self.attrs {
            write!(f, ", {key}={value}")?;
        }
        Ok(())
    }
}

/// 按顶层 ',' 切分文本, 区间 `[a,b]` 内的 ',' 不参与切分
fn split_segments(text: &str) -> impl Iterator<Item = &str> {
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut out = Vec::new();
    for (i, c) in text.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&text[start..]);
    out.into_iter()
}

fn parse_value(text: &str) -> Option<LabelValue> {
    if text.is_empty() {
        return None;
    }
    if text == "true" {
        return Some(LabelValue::Bool(true));
    }
    if text == "false" {
        return Some(LabelValue::Bool(false));
    }
    if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        let (min, max) = inner.split_once(',')?;
        let min = min.trim().parse::<i64>().ok()?;
        let max = max.trim().parse::<i64>().ok()?;
        if min > max {
            return None;
        }
        return Some(LabelValue::IntRange(min, max));
    }
    if let Ok(v) = text.parse::<i64>() {
        return Some(LabelValue::Int(v));
    }
    if text.contains(['[', ']', '=']) {
        return None;
    }
    Some(LabelValue::Str(text.to_string()))
}
