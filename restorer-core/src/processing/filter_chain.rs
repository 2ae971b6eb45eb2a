// ============================================================================
// restorer-core/src/processing/filter_chain.rs
// ============================================================================
//
// FILTER-CHAIN COMPILER: RestoreConfig -> ffmpeg filter graph text
//
// Stages are appended in a fixed order, each behind its own gate:
//
//   input format, decimate                            (video only)
//   deblock, dering, denoise                          (pass 1)
//   interpolate                                       (video only)
//   upscale                                           (always, one branch)
//   sharpen, deband                                   (pass 1)
//   eq, lut3d                                         (pass 1 only)
//   deblock, dering, denoise, sharpen, deband         (pass 2)
//   grain                                             (single stage)
//   output format, range limiter, aspect ratio        (video only)
//
// A category runs in a pass when that pass toggles it on and its global
// kill-switch is off. Deringing has no kill-switch and also needs its own
// `active` flag. The compiler is pure: it reads the config, never fails, and
// compiling the same config twice gives the same text.

use std::fmt;
use std::path::Path;

use crate::config::{
    AiBackend, AiModelType, DebandMethod, FrameRate, HwAccel, Pass, RestorationPass,
    RestoreConfig, Scaler, SharpenMethod, clamp_usm_radius,
};
use crate::discovery::MediaKind;
use crate::encoding::PixelFormat;
use crate::processing::derived::{
    F3kdbParams, Hqdn3dParams, denoise_filter, even_dimension_expr,
};

/// Separator between filters in a linear chain.
pub const FILTER_SEPARATOR: &str = ",";

/// High-precision intermediate format for video restoration.
const WORKING_FORMAT: &str = "yuv444p16le";

/// Restoration or normalization stage a filter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    InputFormat,
    Decimate,
    Deblock,
    Dering,
    Denoise,
    Interpolate,
    Upscale,
    Sharpen,
    Deband,
    ColorEq,
    Lut3d,
    Grain,
    OutputFormat,
    RangeLimiter,
    AspectRatio,
}

/// One emitted filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStage {
    pub kind: StageKind,
    /// Restoration pass, for the categories that have two
    pub pass: Option<Pass>,
    pub filter: String,
}

/// Ordered list of filters, rendered as one comma-joined string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain {
    stages: Vec<FilterStage>,
}

impl FilterChain {
    /// Creates a new empty filter chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter; empty filter text is ignored.
    pub fn push(&mut self, kind: StageKind, pass: Option<Pass>, filter: String) {
        if !filter.is_empty() {
            self.stages.push(FilterStage { kind, pass, filter });
        }
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// True if a stage of this kind was emitted for the given pass.
    pub fn contains(&self, kind: StageKind, pass: Option<Pass>) -> bool {
        self.stages
            .iter()
            .any(|stage| stage.kind == kind && stage.pass == pass)
    }

    /// Renders the chain. Never ends with a separator.
    #[must_use]
    pub fn render(&self) -> String {
        self.stages
            .iter()
            .map(|stage| stage.filter.as_str())
            .collect::<Vec<_>>()
            .join(FILTER_SEPARATOR)
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Quotes a file path for use as a filter option value.
///
/// ffmpeg unescapes filter text twice: once when splitting the graph and once
/// when splitting options. The path is backslash-escaped for the option level,
/// then single-quoted for the graph level, with embedded quotes spliced in as
/// `'\''`.
pub fn quote_filter_path(path: &Path) -> String {
    let mut option_level = String::new();
    for ch in path.to_string_lossy().chars() {
        if matches!(ch, '\\' | '\'' | ':') {
            option_level.push('\\');
        }
        option_level.push(ch);
    }
    format!("'{}'", option_level.replace('\'', "'\\''"))
}

/// Compiles `config` into the filter chain for one input.
///
/// Image inputs skip the temporal stages (decimate, interpolate) and both
/// format normalizations.
pub fn compile_filter_chain(config: &RestoreConfig, media: MediaKind) -> FilterChain {
    let mut chain = FilterChain::new();
    let video = media == MediaKind::Video;
    let pixel_format = PixelFormat::select(config);

    if video {
        let working = if config.pci_safe_mode {
            PixelFormat::Yuv420p.as_str()
        } else {
            WORKING_FORMAT
        };
        chain.push(StageKind::InputFormat, None, format!("format={working}"));

        if !config.disabled.decimate {
            chain.push(
                StageKind::Decimate,
                None,
                "mpdecimate=hi=64*12,setpts=PTS".to_string(),
            );
        }
    }

    push_cleanup_stages(&mut chain, config, Pass::Primary);

    if video && !config.disabled.interpolate {
        chain.push(StageKind::Interpolate, None, interpolate_filter(config));
    }

    chain.push(StageKind::Upscale, None, upscale_filter(config));

    push_detail_stages(&mut chain, config, Pass::Primary);

    if !config.disabled.color_eq {
        let color = &config.color;
        chain.push(
            StageKind::ColorEq,
            None,
            format!(
                "eq=contrast={}:brightness={}:saturation={}",
                color.contrast, color.brightness, color.saturation
            ),
        );
        if let Some(lut) = &color.lut3d_file {
            chain.push(
                StageKind::Lut3d,
                None,
                format!("lut3d=file={}", quote_filter_path(lut)),
            );
        }
    }

    push_cleanup_stages(&mut chain, config, Pass::Secondary);
    push_detail_stages(&mut chain, config, Pass::Secondary);

    if let Some(strength) = grain_strength(config) {
        chain.push(
            StageKind::Grain,
            None,
            format!("noise=alls={strength}:allf=t"),
        );
    }

    if video {
        chain.push(
            StageKind::OutputFormat,
            None,
            format!("format={}", pixel_format.as_str()),
        );
        let limiter = if config.use_10bit && !config.pci_safe_mode {
            "limiter=min=64:max=940:planes=15"
        } else {
            "limiter=min=16:max=235:planes=15"
        };
        chain.push(StageKind::RangeLimiter, None, limiter.to_string());
        chain.push(StageKind::AspectRatio, None, "setsar=1".to_string());
    }

    chain
}

/// Deblock, dering and denoise for one pass.
fn push_cleanup_stages(chain: &mut FilterChain, config: &RestoreConfig, pass: Pass) {
    let settings = config.pass(pass);
    let tag = Some(pass);

    if settings.toggles.deblock && !config.disabled.deblock {
        let deblock = &settings.deblock;
        let filter = match deblock.threshold.as_deref() {
            Some(threshold) => format!("deblock=filter={}:block=8:{threshold}", deblock.mode),
            None => format!("deblock=filter={}:block=8", deblock.mode),
        };
        chain.push(StageKind::Deblock, tag, filter);
    }

    if settings.toggles.dering && settings.dering.active {
        chain.push(
            StageKind::Dering,
            tag,
            Hqdn3dParams::for_dering(settings.dering.strength).to_filter(),
        );
    }

    if settings.toggles.denoise && !config.disabled.denoise {
        let denoise = settings.denoise;
        chain.push(
            StageKind::Denoise,
            tag,
            denoise_filter(denoise.denoiser, denoise.strength),
        );
    }
}

/// Sharpen and deband for one pass.
fn push_detail_stages(chain: &mut FilterChain, config: &RestoreConfig, pass: Pass) {
    let settings = config.pass(pass);
    let tag = Some(pass);

    if settings.toggles.sharpen && !config.disabled.sharpen {
        chain.push(StageKind::Sharpen, tag, sharpen_filter(settings));
    }

    if settings.toggles.deband && !config.disabled.deband {
        chain.push(StageKind::Deband, tag, deband_filter(settings));
    }
}

fn sharpen_filter(settings: &RestorationPass) -> String {
    let sharpen = &settings.sharpen;
    match sharpen.method {
        SharpenMethod::Unsharp => {
            let size = clamp_usm_radius(sharpen.usm_radius);
            format!("unsharp={size}:{size}:{}", sharpen.usm_amount)
        }
        SharpenMethod::Cas => format!("cas=strength={}", sharpen.strength),
    }
}

fn deband_filter(settings: &RestorationPass) -> String {
    let deband = &settings.deband;
    match deband.method {
        DebandMethod::Gradfun => format!("gradfun={}", deband.strength),
        DebandMethod::F3kdb => {
            F3kdbParams::new(deband.f3kdb_range, deband.f3kdb_y, deband.f3kdb_cbcr).to_filter()
        }
        DebandMethod::Deband => format!("deband=1thr={}:b=1", deband.strength),
    }
}

fn interpolate_filter(config: &RestoreConfig) -> String {
    let tail = format!(
        "mi_mode={}:mc_mode=aobmc:me_mode=bidir:vsbmc=1",
        config.mi_mode
    );
    match config.fps {
        FrameRate::Lock => format!("minterpolate={tail}"),
        FrameRate::Fixed(fps) => format!("minterpolate=fps={fps}:{tail}"),
    }
}

fn upscale_filter(config: &RestoreConfig) -> String {
    let factor = config.scale_factor;
    let width = even_dimension_expr("iw", factor);
    let height = even_dimension_expr("ih", factor);

    match config.scaler {
        Scaler::Zscale => format!(
            "zscale=w={width}:h={height}:filter=lanczos:dither=error_diffusion"
        ),
        Scaler::Ai => {
            let ai = &config.ai;
            let model = quote_filter_path(&ai.model_path);
            match ai.backend {
                AiBackend::Sr => {
                    let mut filter = format!("sr=dnn_backend={}:model={model}", ai.dnn_backend);
                    // Only SRCNN lacks a built-in upsampling layer.
                    if ai.model_type == AiModelType::Srcnn {
                        filter.push_str(&format!(":scale_factor={factor}"));
                    }
                    filter
                }
                AiBackend::Dnn => format!(
                    "dnn_processing=dnn_backend={}:model={model}:input=x:output=y",
                    ai.dnn_backend
                ),
            }
        }
        Scaler::Hw if config.hwaccel == HwAccel::Cuda => format!("scale_npp={width}:{height}"),
        Scaler::Hw => format!("scale={width}:{height}:flags=lanczos"),
        Scaler::Lanczos => format!("scale={width}:{height}:flags=lanczos+accurate_rnd"),
    }
}

/// Grain strength for the single grain stage, if it runs.
///
/// The secondary pass's strength replaces the primary one when its toggle is
/// on; grain is never applied twice.
fn grain_strength(config: &RestoreConfig) -> Option<f64> {
    if config.disabled.grain {
        return None;
    }
    let primary = config.primary();
    let secondary = config.secondary();
    if secondary.toggles.grain {
        Some(secondary.grain.strength)
    } else if primary.toggles.grain {
        Some(primary.grain.strength)
    } else {
        None
    }
}
