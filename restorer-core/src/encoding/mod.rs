// ============================================================================
// restorer-core/src/encoding/mod.rs
// ============================================================================
//
// ENCODING: Pixel-format and codec selection
//
// Decides, once per job, the output pixel format and the concrete encoder the
// argument assembler will name. The filter-chain compiler reads the same
// decision for its final format cast, so the chain and the `-pix_fmt` flag can
// never disagree.
//
// Decision table:
// - 10-bit requested            -> yuv420p10le, else yuv420p
// - 10-bit with NVENC           -> p010le
// - compatibility-safe mode     -> yuv420p, overriding both rules above
//
// Encoder ids form a {h264, hevc} x {software, nvenc, qsv, vaapi} table. Every
// HEVC encoder is tagged `hvc1` for player compatibility.

pub mod x265;

use crate::config::{Codec, Encoder, RestoreConfig};

pub use x265::normalize_x265_params;

/// Output pixel formats the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Yuv420p,
    Yuv420p10le,
    /// NVIDIA's packed 10-bit layout
    P010le,
}

impl PixelFormat {
    /// Applies the decision table above.
    pub fn select(config: &RestoreConfig) -> Self {
        if config.pci_safe_mode {
            return PixelFormat::Yuv420p;
        }
        match (config.use_10bit, config.encoder) {
            (true, Encoder::Nvenc) => PixelFormat::P010le,
            (true, _) => PixelFormat::Yuv420p10le,
            (false, _) => PixelFormat::Yuv420p,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PixelFormat::Yuv420p => "yuv420p",
            PixelFormat::Yuv420p10le => "yuv420p10le",
            PixelFormat::P010le => "p010le",
        }
    }

    pub fn is_10bit(&self) -> bool {
        !matches!(self, PixelFormat::Yuv420p)
    }
}

/// Concrete ffmpeg encoder name for a codec and encoder family.
pub fn encoder_id(codec: Codec, encoder: Encoder) -> &'static str {
    match (codec, encoder) {
        (Codec::H264, Encoder::Auto) => "libx264",
        (Codec::H264, Encoder::Nvenc) => "h264_nvenc",
        (Codec::H264, Encoder::Qsv) => "h264_qsv",
        (Codec::H264, Encoder::Vaapi) => "h264_vaapi",
        (Codec::Hevc, Encoder::Auto) => "libx265",
        (Codec::Hevc, Encoder::Nvenc) => "hevc_nvenc",
        (Codec::Hevc, Encoder::Qsv) => "hevc_qsv",
        (Codec::Hevc, Encoder::Vaapi) => "hevc_vaapi",
    }
}

/// Everything the assembler needs to name the video encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSettings {
    pub pixel_format: PixelFormat,
    pub encoder_id: &'static str,
    /// Emit `-tag:v hvc1`
    pub hvc1_tag: bool,
    /// Emit `-preset` and `-crf`; VAAPI encoders reject them
    pub rate_control: bool,
    /// Colon-delimited `-x265-params` value, only for libx265
    pub x265_params: Option<String>,
}

impl EncodeSettings {
    pub fn resolve(config: &RestoreConfig) -> Self {
        let encoder_id = encoder_id(config.codec, config.encoder);
        let is_libx265 = config.codec == Codec::Hevc && config.encoder == Encoder::Auto;
        let x265_params = (is_libx265 && !config.x265_params.trim().is_empty())
            .then(|| normalize_x265_params(&config.x265_params));

        Self {
            pixel_format: PixelFormat::select(config),
            encoder_id,
            hvc1_tag: config.codec == Codec::Hevc,
            rate_control: config.encoder != Encoder::Vaapi,
            x265_params,
        }
    }
}
