//! 格式探测器目录.
//!
//! 简单格式 (起始魔数、RIFF 表单) 不写函数, 在内置表里以数据给出
//! 参数; 需要真正解析的格式各有专门模块. 注册名、优先级、扩展名
//! 提示与默认标签都集中在 [`register_all`] 的内置表里.

pub mod aac;
pub mod archive;
pub mod audio;
pub mod image;
pub mod iso;
pub mod matroska;
pub mod mp3;
pub mod mpeg;
pub mod ogg;
pub mod tag;
pub mod text;
pub mod tracker;
pub mod video;

use shi_core::error::ShiResult;
use shi_core::score::{ProbeScore, SCORE_LIKELY, SCORE_MAX};
use shi_core::MediaLabel;

use crate::registry::{
    Kernel, ProbeFn, ProbeRank, Registration, TypeFindRegistry, RANK_MARGINAL, RANK_PRIMARY,
    RANK_SECONDARY,
};

/// 内置表里一个探测器的内核参数
enum BuiltinKernel {
    /// 起始魔数
    StartsWith(&'static [u8], ProbeScore),
    /// RIFF 表单
    Riff(&'static [u8; 4]),
    /// 探测函数
    Fn(ProbeFn),
}

/// 内置表的一行
struct Builtin {
    name: &'static str,
    rank: ProbeRank,
    kernel: BuiltinKernel,
    extensions: &'static [&'static str],
    label: &'static str,
}

use BuiltinKernel::{Fn, Riff, StartsWith};

/// 内置探测器表
static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "video/x-ms-asf",
        rank: RANK_SECONDARY,
        kernel: StartsWith(
            &[
                0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00,
                0x62, 0xCE, 0x6C,
            ],
            SCORE_MAX,
        ),
        extensions: &["asf", "wm", "wma", "wmv"],
        label: "video/x-ms-asf",
    },
    // 比满分低一点, 这样 ID3v1 或 APE 标签能以更高分被先认出来
    Builtin {
        name: "audio/x-musepack",
        rank: RANK_PRIMARY,
        kernel: StartsWith(b"MP+", SCORE_LIKELY + 10),
        extensions: &["mpc"],
        label: "audio/x-musepack",
    },
    Builtin {
        name: "audio/x-au",
        rank: RANK_MARGINAL,
        kernel: Fn(audio::au_probe),
        extensions: &["au", "snd"],
        label: "audio/x-au",
    },
    Builtin {
        name: "video/x-msvideo",
        rank: RANK_PRIMARY,
        kernel: Riff(b"AVI "),
        extensions: &["avi"],
        label: "video/x-msvideo",
    },
    Builtin {
        name: "video/x-cdxa",
        rank: RANK_PRIMARY,
        kernel: Riff(b"CDXA"),
        extensions: &["dat"],
        label: "video/x-cdxa",
    },
    Builtin {
        name: "video/x-vcd",
        rank: RANK_PRIMARY,
        kernel: StartsWith(
            &[0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00],
            SCORE_MAX,
        ),
        extensions: &["dat"],
        label: "video/x-vcd",
    },
    Builtin {
        name: "audio/x-flac",
        rank: RANK_PRIMARY,
        kernel: StartsWith(b"fLaC", SCORE_MAX),
        extensions: &["flac"],
        label: "audio/x-flac",
    },
    Builtin {
        name: "video/x-fli",
        rank: RANK_MARGINAL,
        kernel: Fn(video::flx_probe),
        extensions: &["flc", "fli"],
        label: "video/x-fli",
    },
    Builtin {
        name: "application/x-id3",
        rank: RANK_PRIMARY + 2,
        kernel: Fn(tag::id3_probe),
        extensions: &["mp3", "mp2", "mp1", "mpga", "ogg", "flac", "tta"],
        label: "application/x-id3",
    },
    Builtin {
        name: "application/x-apetag",
        rank: RANK_PRIMARY + 1,
        kernel: Fn(tag::apetag_probe),
        extensions: &["ape", "mpc", "wv"],
        label: "application/x-apetag",
    },
    Builtin {
        name: "audio/x-ttafile",
        rank: RANK_PRIMARY,
        kernel: Fn(audio::tta_probe),
        extensions: &["tta"],
        label: "audio/x-ttafile",
    },
    Builtin {
        name: "audio/x-mod",
        rank: RANK_SECONDARY,
        kernel: Fn(tracker::tracker_probe),
        extensions: &[
            "669", "amf", "dsm", "gdm", "far", "imf", "it", "med", "mod", "mtm", "okt", "sam",
            "s3m", "stm", "stx", "ult", "xm",
        ],
        label: "audio/x-mod",
    },
    // RIFF 容器装的 DSM 模块
    Builtin {
        name: "audio/x-mod-dsm",
        rank: RANK_SECONDARY,
        kernel: Riff(b"DSMF"),
        extensions: &["dsm"],
        label: "audio/x-mod",
    },
    Builtin {
        name: "audio/mpeg",
        rank: RANK_PRIMARY,
        kernel: Fn(mp3::mp3_probe),
        extensions: &["mp3", "mp2", "mp1", "mpga"],
        label: "audio/mpeg, mpegversion=1, layer=[1,3]",
    },
    Builtin {
        name: "audio/x-ac3",
        rank: RANK_PRIMARY,
        kernel: Fn(audio::ac3_probe),
        extensions: &["ac3"],
        label: "audio/x-ac3",
    },
    Builtin {
        name: "video/mpeg1",
        rank: RANK_PRIMARY,
        kernel: Fn(mpeg::mpeg1_sys_probe),
        extensions: &["mpe", "mpeg", "mpg"],
        label: "video/mpeg, systemstream=true, mpegversion=[1,2]",
    },
    Builtin {
        name: "video/mpeg2",
        rank: RANK_SECONDARY,
        kernel: Fn(mpeg::mpeg2_sys_probe),
        extensions: &["mpe", "mpeg", "mpg"],
        label: "video/mpeg, systemstream=true, mpegversion=[1,2]",
    },
    Builtin {
        name: "application/ogg",
        rank: RANK_PRIMARY,
        kernel: Fn(ogg::ogg_probe),
        extensions: &["anx", "ogg", "ogm"],
        label: "application/ogg",
    },
    Builtin {
        name: "video/mpeg",
        rank: RANK_SECONDARY,
        kernel: Fn(mpeg::mpeg_video_probe),
        extensions: &["mpv", "mpeg", "mpg"],
        label: "video/mpeg, systemstream=false",
    },
    Builtin {
        name: "video/mpeg-stream",
        rank: RANK_MARGINAL,
        kernel: Fn(mpeg::mpeg_video_stream_probe),
        extensions: &["mpv", "mpeg", "mpg"],
        label: "video/mpeg, systemstream=false",
    },
    Builtin {
        name: "video/mpeg4",
        rank: RANK_PRIMARY,
        kernel: Fn(mpeg::mpeg4_video_probe),
        extensions: &["m4v"],
        label: "video/mpeg, systemstream=false, mpegversion=4",
    },
    // ISO 基媒体家族
    Builtin {
        name: "audio/x-m4a",
        rank: RANK_PRIMARY,
        kernel: Fn(iso::m4a_probe),
        extensions: &["m4a"],
        label: "audio/x-m4a",
    },
    Builtin {
        name: "application/x-3gp",
        rank: RANK_PRIMARY,
        kernel: Fn(iso::q3gp_probe),
        extensions: &["3gp"],
        label: "application/x-3gp",
    },
    Builtin {
        name: "video/quicktime",
        rank: RANK_SECONDARY,
        kernel: Fn(iso::qt_probe),
        extensions: &["mov"],
        label: "video/quicktime",
    },
    Builtin {
        name: "application/vnd.rn-realmedia",
        rank: RANK_SECONDARY,
        kernel: StartsWith(b".RMF", SCORE_MAX),
        extensions: &["ra", "ram", "rm", "rmvb"],
        label: "application/vnd.rn-realmedia",
    },
    Builtin {
        name: "application/x-shockwave-flash",
        rank: RANK_SECONDARY,
        kernel: Fn(video::swf_probe),
        extensions: &["swf", "swfl"],
        label: "application/x-shockwave-flash",
    },
    Builtin {
        name: "video/x-flv",
        rank: RANK_SECONDARY,
        kernel: StartsWith(b"FLV", SCORE_MAX),
        extensions: &["flv"],
        label: "video/x-flv",
    },
    Builtin {
        name: "text/plain",
        rank: RANK_MARGINAL,
        kernel: Fn(text::utf8_probe),
        extensions: &["txt"],
        label: "text/plain",
    },
    Builtin {
        name: "text/uri-list",
        rank: RANK_MARGINAL,
        kernel: Fn(text::uri_probe),
        extensions: &["ram"],
        label: "text/uri-list",
    },
    Builtin {
        name: "application/smil",
        rank: RANK_SECONDARY,
        kernel: Fn(text::smil_probe),
        extensions: &["smil"],
        label: "application/smil",
    },
    Builtin {
        name: "application/xml",
        rank: RANK_MARGINAL,
        kernel: Fn(text::xml_probe),
        extensions: &["xml"],
        label: "application/xml",
    },
    Builtin {
        name: "audio/x-wav",
        rank: RANK_PRIMARY,
        kernel: Riff(b"WAVE"),
        extensions: &["wav"],
        label: "audio/x-wav",
    },
    Builtin {
        name: "audio/x-aiff",
        rank: RANK_SECONDARY,
        kernel: Fn(audio::aiff_probe),
        extensions: &["aiff", "aif", "aifc"],
        label: "audio/x-aiff",
    },
    Builtin {
        name: "audio/x-svx",
        rank: RANK_SECONDARY,
        kernel: Fn(audio::svx_probe),
        extensions: &["iff", "svx"],
        label: "audio/x-svx",
    },
    Builtin {
        name: "audio/x-paris",
        rank: RANK_SECONDARY,
        kernel: Fn(audio::paris_probe),
        extensions: &["paf"],
        label: "audio/x-paris",
    },
    Builtin {
        name: "audio/x-nist",
        rank: RANK_SECONDARY,
        kernel: StartsWith(b"NIST", SCORE_MAX),
        extensions: &["nist"],
        label: "audio/x-nist",
    },
    Builtin {
        name: "audio/x-voc",
        rank: RANK_SECONDARY,
        kernel: StartsWith(b"Creative", SCORE_MAX),
        extensions: &["voc"],
        label: "audio/x-voc",
    },
    Builtin {
        name: "audio/x-sds",
        rank: RANK_SECONDARY,
        kernel: Fn(audio::sds_probe),
        extensions: &["sds"],
        label: "audio/x-sds",
    },
    Builtin {
        name: "audio/x-ircam",
        rank: RANK_SECONDARY,
        kernel: Fn(audio::ircam_probe),
        extensions: &["sf"],
        label: "audio/x-ircam",
    },
    // Sony Wave64 的小写 riff 魔数
    Builtin {
        name: "audio/x-w64",
        rank: RANK_SECONDARY,
        kernel: StartsWith(b"riff", SCORE_MAX),
        extensions: &["w64"],
        label: "audio/x-w64",
    },
    Builtin {
        name: "audio/x-shorten",
        rank: RANK_SECONDARY,
        kernel: Fn(audio::shn_probe),
        extensions: &["shn"],
        label: "audio/x-shorten",
    },
    Builtin {
        name: "application/x-ape",
        rank: RANK_SECONDARY,
        kernel: Fn(audio::ape_probe),
        extensions: &["ape"],
        label: "application/x-ape",
    },
    Builtin {
        name: "image/jpeg",
        rank: RANK_PRIMARY,
        kernel: Fn(image::jpeg_probe),
        extensions: &["jpg", "jpe", "jpeg"],
        label: "image/jpeg",
    },
    Builtin {
        name: "image/gif",
        rank: RANK_PRIMARY,
        kernel: StartsWith(b"GIF8", SCORE_MAX),
        extensions: &["gif"],
        label: "image/gif",
    },
    Builtin {
        name: "image/png",
        rank: RANK_PRIMARY,
        kernel: StartsWith(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], SCORE_MAX),
        extensions: &["png"],
        label: "image/png",
    },
    Builtin {
        name: "image/bmp",
        rank: RANK_PRIMARY,
        kernel: Fn(image::bmp_probe),
        extensions: &["bmp"],
        label: "image/bmp",
    },
    Builtin {
        name: "image/tiff",
        rank: RANK_PRIMARY,
        kernel: Fn(image::tiff_probe),
        extensions: &["tif", "tiff"],
        label: "image/tiff",
    },
    Builtin {
        name: "video/x-matroska",
        rank: RANK_PRIMARY,
        kernel: Fn(matroska::matroska_probe),
        extensions: &["mkv", "mka"],
        label: "video/x-matroska",
    },
    Builtin {
        name: "video/x-dv",
        rank: RANK_SECONDARY,
        kernel: Fn(video::dv_probe),
        extensions: &["dv", "dif"],
        label: "video/x-dv, systemstream=true",
    },
    Builtin {
        name: "audio/x-amr-nb-sh",
        rank: RANK_PRIMARY,
        kernel: StartsWith(b"#!AMR", SCORE_LIKELY),
        extensions: &["amr"],
        label: "audio/x-amr-nb-sh",
    },
    Builtin {
        name: "audio/x-amr-wb-sh",
        rank: RANK_PRIMARY,
        kernel: StartsWith(b"#!AMR-WB", SCORE_MAX),
        extensions: &["amr"],
        label: "audio/x-amr-wb-sh",
    },
    Builtin {
        name: "audio/iLBC-sh",
        rank: RANK_PRIMARY,
        kernel: Fn(audio::ilbc_probe),
        extensions: &["ilbc"],
        label: "audio/iLBC-sh",
    },
    Builtin {
        name: "audio/x-sid",
        rank: RANK_MARGINAL,
        kernel: StartsWith(b"PSID", SCORE_MAX),
        extensions: &["sid"],
        label: "audio/x-sid",
    },
    Builtin {
        name: "image/x-xcf",
        rank: RANK_SECONDARY,
        kernel: StartsWith(b"gimp xcf", SCORE_MAX),
        extensions: &["xcf"],
        label: "image/x-xcf",
    },
    Builtin {
        name: "video/x-mng",
        rank: RANK_SECONDARY,
        kernel: StartsWith(&[0x8A, 0x4D, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], SCORE_MAX),
        extensions: &["mng"],
        label: "video/x-mng",
    },
    Builtin {
        name: "image/x-jng",
        rank: RANK_SECONDARY,
        kernel: StartsWith(&[0x8B, 0x4A, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], SCORE_MAX),
        extensions: &["jng"],
        label: "image/x-jng",
    },
    Builtin {
        name: "image/x-xpixmap",
        rank: RANK_SECONDARY,
        kernel: StartsWith(b"/* XPM */", SCORE_MAX),
        extensions: &["xpm"],
        label: "image/x-xpixmap",
    },
    Builtin {
        name: "image/x-sun-raster",
        rank: RANK_SECONDARY,
        kernel: StartsWith(&[0x59, 0xA6, 0x6A, 0x95], SCORE_MAX),
        extensions: &["ras"],
        label: "image/x-sun-raster",
    },
    Builtin {
        name: "application/x-bzip",
        rank: RANK_SECONDARY,
        kernel: StartsWith(b"BZh", SCORE_LIKELY),
        extensions: &["bz2"],
        label: "application/x-bzip",
    },
    Builtin {
        name: "application/x-gzip",
        rank: RANK_SECONDARY,
        kernel: StartsWith(&[0x1F, 0x8B], SCORE_LIKELY),
        extensions: &["gz"],
        label: "application/x-gzip",
    },
    Builtin {
        name: "application/zip",
        rank: RANK_SECONDARY,
        kernel: StartsWith(b"PK\x03\x04", SCORE_LIKELY),
        extensions: &["zip"],
        label: "application/zip",
    },
    Builtin {
        name: "application/x-compress",
        rank: RANK_SECONDARY,
        kernel: StartsWith(&[0x1F, 0x9D], SCORE_LIKELY),
        extensions: &["Z"],
        label: "application/x-compress",
    },
    // OGG 负载
    Builtin {
        name: "audio/x-vorbis",
        rank: RANK_PRIMARY,
        kernel: Fn(ogg::vorbis_probe),
        extensions: &[],
        label: "audio/x-vorbis",
    },
    Builtin {
        name: "video/x-theora",
        rank: RANK_PRIMARY,
        kernel: Fn(ogg::theora_probe),
        extensions: &[],
        label: "video/x-theora",
    },
    Builtin {
        name: "application/x-ogm-video",
        rank: RANK_PRIMARY,
        kernel: Fn(ogg::ogm_video_probe),
        extensions: &[],
        label: "application/x-ogm-video",
    },
    Builtin {
        name: "application/x-ogm-audio",
        rank: RANK_PRIMARY,
        kernel: Fn(ogg::ogm_audio_probe),
        extensions: &[],
        label: "application/x-ogm-audio",
    },
    Builtin {
        name: "application/x-ogm-text",
        rank: RANK_PRIMARY,
        kernel: Fn(ogg::ogm_text_probe),
        extensions: &[],
        label: "application/x-ogm-text",
    },
    Builtin {
        name: "audio/x-speex",
        rank: RANK_PRIMARY,
        kernel: Fn(ogg::speex_probe),
        extensions: &[],
        label: "audio/x-speex",
    },
    Builtin {
        name: "application/x-ogg-skeleton",
        rank: RANK_PRIMARY,
        kernel: Fn(ogg::oggskel_probe),
        extensions: &[],
        label: "application/x-ogg-skeleton, parsed=false",
    },
    Builtin {
        name: "text/x-cmml",
        rank: RANK_PRIMARY,
        kernel: Fn(ogg::cmml_probe),
        extensions: &[],
        label: "text/x-cmml",
    },
    Builtin {
        name: "application/x-executable",
        rank: RANK_MARGINAL,
        kernel: StartsWith(&[0x7F, 0x45, 0x4C, 0x46], SCORE_MAX),
        extensions: &[],
        label: "application/x-executable",
    },
    Builtin {
        name: "adts_mpeg_stream",
        rank: RANK_SECONDARY,
        kernel: Fn(aac::aac_probe),
        extensions: &["aac"],
        label: "audio/mpeg, framed=false, mpegversion=[2,4]",
    },
    Builtin {
        name: "audio/x-spc",
        rank: RANK_SECONDARY,
        kernel: StartsWith(b"SNES-SPC700 Sound File Data", SCORE_MAX),
        extensions: &["spc"],
        label: "audio/x-spc",
    },
    Builtin {
        name: "audio/x-wavpack",
        rank: RANK_SECONDARY,
        kernel: Fn(audio::wavpack_probe),
        extensions: &["wv", "wvp"],
        label: "audio/x-wavpack, framed=false",
    },
    Builtin {
        name: "audio/x-wavpack-correction",
        rank: RANK_SECONDARY,
        kernel: Fn(audio::wavpack_probe),
        extensions: &["wvc"],
        label: "audio/x-wavpack-correction, framed=false",
    },
    Builtin {
        name: "application/x-rar",
        rank: RANK_SECONDARY,
        kernel: StartsWith(b"Rar!", SCORE_LIKELY),
        extensions: &["rar"],
        label: "application/x-rar",
    },
    Builtin {
        name: "application/x-tar",
        rank: RANK_SECONDARY,
        kernel: Fn(archive::tar_probe),
        extensions: &["tar"],
        label: "application/x-tar",
    },
    Builtin {
        name: "application/x-ar",
        rank: RANK_SECONDARY,
        kernel: Fn(archive::ar_probe),
        extensions: &["a"],
        label: "application/x-ar",
    },
    Builtin {
        name: "application/x-ms-dos-executable",
        rank: RANK_SECONDARY,
        kernel: Fn(archive::msdos_probe),
        extensions: &["dll", "exe", "ocx", "sys", "scr", "msstyles", "cpl"],
        label: "application/x-ms-dos-executable",
    },
    Builtin {
        name: "video/x-dirac",
        rank: RANK_PRIMARY,
        kernel: StartsWith(b"BBCD", SCORE_LIKELY),
        extensions: &[],
        label: "video/x-dirac",
    },
];

/// 注册所有内置探测器
pub fn register_all(registry: &mut TypeFindRegistry) -> ShiResult<()> {
    for spec in BUILTINS {
        let label = MediaLabel::parse(spec.label)?;
        let kernel = match &spec.kernel {
            StartsWith(magic, score) => Kernel::StartsWith {
                magic: magic.to_vec(),
                score: *score,
            },
            Riff(form) => Kernel::Riff { form: **form },
            Fn(probe) => Kernel::Fn(*probe),
        };
        registry.register(Registration {
            name: spec.name.to_string(),
            rank: spec.rank,
            kernel,
            extensions: spec.extensions.iter().map(|e| e.to_string()).collect(),
            label,
        })?;
    }
    Ok(())
}
