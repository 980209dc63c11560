//! 音乐模块 (tracker) 格式探测.
//!
//! 各家格式的魔数散落在不同的固定偏移 (0, 44, 60, 71, 1080),
//! 统一归入 `audio/x-mod`. 每个偏移各自 peek, 窗口之间互不借用.
//! RIFF 容器装的 DSMF 走注册表里的 RIFF 内核, 不在这里.

use shi_core::score::{SCORE_LIKELY, SCORE_MAX};
use shi_core::MediaLabel;

use crate::context::TypeFind;

fn mod_label() -> MediaLabel {
    MediaLabel::new("audio/x-mod")
}

/// 音乐模块格式探测
pub fn tracker_probe(tf: &mut TypeFind<'_>) {
    // MOD 家族: 魔数在 1080 处
    if let Some(data) = tf.peek(1080, 4) {
        // Protracker 及变体
        let hit = &data[0..4] == b"M.K."
            || &data[0..4] == b"M!K!"
            // Star Tracker
            || (&data[0..3] == b"FLT" && data[3].is_ascii_digit())
            || (&data[0..3] == b"EXO" && data[3].is_ascii_digit())
            // Oktalyzer (Amiga) 与 Oktalyser (Atari)
            || &data[0..4] == b"OKTA"
            || &data[0..4] == b"CD81"
            // Fasttracker
            || (&data[1..4] == b"CHN" && data[0].is_ascii_digit())
            // Fasttracker 或 Taketracker
            || (&data[2..4] == b"CH" && data[0].is_ascii_digit() && data[1].is_ascii_digit())
            || (&data[2..4] == b"CN" && data[0].is_ascii_digit() && data[1].is_ascii_digit());
        if hit {
            tf.suggest(SCORE_MAX, mod_label());
            return;
        }
    }

    // XM
    if let Some(data) = tf.peek(0, 38) {
        if &data[0..17] == b"Extended Module: " && data[37] == 0x1A {
            tf.suggest(SCORE_MAX, mod_label());
            return;
        }
    }

    // OKT
    if let Some(data) = tf.peek(0, 8) {
        if data == b"OKTASONG" {
            tf.suggest(SCORE_MAX, mod_label());
            return;
        }
    }

    if let Some(data) = tf.peek(0, 4) {
        // 669
        if &data[0..2] == b"if" || &data[0..2] == b"JN" {
            tf.suggest(SCORE_LIKELY, mod_label());
            return;
        }
        // AMF / IT / MED / MTM
        if (&data[0..3] == b"AMF" && data[3] > 10 && data[3] < 14)
            || data == b"IMPM"
            || data == b"MMD0"
            || data == b"MMD1"
            || &data[0..3] == b"MTM"
        {
            tf.suggest(SCORE_MAX, mod_label());
            return;
        }
        // FAM: 魔数之外还要对 44 处的附加标识
        if data == b"FAM\xFE" {
            match tf.peek(44, 3) {
                Some(extra) => {
                    if extra == b"com" {
                        tf.suggest(SCORE_MAX, mod_label());
                        return;
                    }
                }
                None => {
                    tf.suggest(SCORE_LIKELY, mod_label());
                    return;
                }
            }
        }
        // GDM: 魔数之外还要对 71 处的附加标识
        if data == b"GDM\xFE" {
            match tf.peek(71, 4) {
                Some(extra) => {
                    if extra == b"GMFS" {
                        tf.suggest(SCORE_MAX, mod_label());
                        return;
                    }
                }
                None => {
                    tf.suggest(SCORE_LIKELY, mod_label());
                    return;
                }
            }
        }
    }

    // IMF
    if let Some(data) = tf.peek(60, 4) {
        if data == b"IM10" {
            tf.suggest(SCORE_MAX, mod_label());
            return;
        }
    }

    // S3M
    if let Some(data) = tf.peek(44, 4) {
        if data == b"SCRM" {
            tf.suggest(SCORE_MAX, mod_label());
        }
    }
}
