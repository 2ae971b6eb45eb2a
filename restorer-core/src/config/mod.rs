//! Configuration record for the restoration pipeline.
//!
//! `RestoreConfig` is the only state the compiler consumes. It is built from
//! defaults, optionally replaced by a preset, then edited field by field through
//! [`RestoreConfig::apply_setting`] or the builder. It is immutable for the
//! duration of one job.

/// Declares a string-keyed knob enum: canonical name first, then accepted aliases.
macro_rules! knob_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($knob:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $canonical:literal $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// The canonical settings-table spelling of this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $canonical ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $( $canonical $(| $alias)* => Ok(Self::$variant), )+
                    _ => Err($crate::error::CoreError::InvalidOptions(format!(
                        "unknown {} '{}'",
                        $knob, s
                    ))),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::error::CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }
    };
}

mod builder;
mod pass;
mod settings;

use crate::error::{CoreError, CoreResult};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub use builder::RestoreConfigBuilder;
pub use pass::{
    DebandMethod, DebandSettings, DeblockMode, DeblockSettings, DenoiseSettings, DenoiseStrength,
    Denoiser, DeringSettings, DisabledStages, GrainSettings, MAX_F3KDB_RANGE, Pass,
    RestorationPass, SharpenMethod, SharpenSettings, StageToggles, USM_AMOUNT_RANGE,
};
pub use settings::{parse_strength, split_assignment};
pub(crate) use settings::clamp_usm_radius;

// Default constants

/// Default constant rate factor for the software encoders.
pub const DEFAULT_CRF: f64 = 16.0;

/// Default encoder speed preset.
pub const DEFAULT_ENCODER_PRESET: &str = "slow";

/// Default interpolation target in frames per second.
pub const DEFAULT_FPS: f64 = 60.0;

/// Default upscale factor applied to both dimensions.
pub const DEFAULT_SCALE_FACTOR: f64 = 2.0;

/// Largest accepted upscale factor.
pub const MAX_SCALE_FACTOR: f64 = 8.0;

/// Largest accepted `-crf` value (libx264 8-bit and libx265 both stop at 51,
/// 10-bit libx264 at 63).
pub const MAX_CRF: f64 = 63.0;

/// Default AAC bitrate. The literal `copy` passes audio through untouched.
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";

/// Audio bitrate value that selects stream copy instead of AAC.
pub const AUDIO_PASSTHROUGH: &str = "copy";

/// Default container flags for MP4 output.
pub const DEFAULT_MOVFLAGS: &str = "+faststart";

/// Default libx265 parameter string, comma-delimited as users type it.
pub const DEFAULT_X265_PARAMS: &str = "aq-mode=3,psy-rd=2.0,deblock=-2,-2";

/// Default inference backend for the AI scalers.
pub const DEFAULT_DNN_BACKEND: &str = "tensorflow";

pub const DEFAULT_EQ_CONTRAST: f64 = 1.03;
pub const DEFAULT_EQ_BRIGHTNESS: f64 = 0.005;
pub const DEFAULT_EQ_SATURATION: f64 = 1.06;
/// Brightness offset range accepted by ffmpeg's `eq`.
pub const BRIGHTNESS_RANGE: (f64, f64) = (-1.0, 1.0);

knob_enum! {
    /// Output video codec family.
    pub enum Codec ("codec") {
        #[default]
        H264 => "h264" | "avc" | "x264",
        Hevc => "hevc" | "h265" | "x265",
    }
}

knob_enum! {
    /// Hardware decoder passed to `-hwaccel`.
    pub enum HwAccel ("hwaccel") {
        #[default]
        None => "none" | "off" | "",
        Cuda => "cuda",
        VideoToolbox => "videotoolbox",
        Qsv => "qsv",
        Vaapi => "vaapi",
    }
}

knob_enum! {
    /// Encoder family; `Auto` means the software encoder for the codec.
    pub enum Encoder ("encoder") {
        #[default]
        Auto => "auto" | "software" | "cpu",
        Nvenc => "nvenc" | "hevc_nvenc" | "h264_nvenc",
        Qsv => "qsv",
        Vaapi => "vaapi",
    }
}

knob_enum! {
    /// Upscaler selection. Exactly one scaling stage is emitted per job.
    pub enum Scaler ("scaler") {
        #[default]
        Lanczos => "lanczos" | "scale",
        Zscale => "zscale",
        Ai => "ai",
        Hw => "hw",
    }
}

knob_enum! {
    /// ffmpeg filter used for model-based upscaling.
    pub enum AiBackend ("ai_backend") {
        #[default]
        Sr => "sr",
        Dnn => "dnn" | "dnn_processing",
    }
}

knob_enum! {
    /// Architecture of the AI model; `srcnn` needs an explicit scale factor.
    pub enum AiModelType ("ai_model_type") {
        Srcnn => "srcnn",
        #[default]
        Espcn => "espcn",
        Edsr => "edsr",
        Fsrcnn => "fsrcnn",
    }
}

knob_enum! {
    /// Motion interpolation mode for `minterpolate`.
    pub enum MiMode ("mi_mode") {
        #[default]
        Mci => "mci",
        Blend => "blend",
        Dup => "dup",
    }
}

/// Target frame rate for interpolation.
///
/// `Lock` keeps the source frame count and only retimes (`source` or `lock` in
/// the settings table).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FrameRate {
    Fixed(f64),
    Lock,
}

impl Default for FrameRate {
    fn default() -> Self {
        FrameRate::Fixed(DEFAULT_FPS)
    }
}

impl From<String> for FrameRate {
    fn from(value: String) -> Self {
        settings::parse_frame_rate(&value)
    }
}

impl From<FrameRate> for String {
    fn from(value: FrameRate) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameRate::Fixed(fps) => write!(f, "{fps}"),
            FrameRate::Lock => f.write_str("lock"),
        }
    }
}

/// Model-based upscaler fields, used only when `scaler` is [`Scaler::Ai`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub backend: AiBackend,
    pub model_path: PathBuf,
    pub model_type: AiModelType,
    pub dnn_backend: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            backend: AiBackend::default(),
            model_path: PathBuf::new(),
            model_type: AiModelType::default(),
            dnn_backend: DEFAULT_DNN_BACKEND.to_string(),
        }
    }
}

/// Color equalization and optional 3D LUT. Applied once, in the primary pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    pub contrast: f64,
    pub brightness: f64,
    pub saturation: f64,
    pub lut3d_file: Option<PathBuf>,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            contrast: DEFAULT_EQ_CONTRAST,
            brightness: DEFAULT_EQ_BRIGHTNESS,
            saturation: DEFAULT_EQ_SATURATION,
            lut3d_file: None,
        }
    }
}

/// Main configuration record for one restoration job.
///
/// All fields have defaults, so a usable record is `RestoreConfig::default()`.
///
/// # Examples
///
/// ```rust
/// use restorer_core::config::{Codec, RestoreConfig};
///
/// let mut config = RestoreConfig::default();
/// config.apply_setting("codec", "hevc").unwrap();
/// config.apply_setting("use_denoise_2", "1").unwrap();
/// assert_eq!(config.codec, Codec::Hevc);
/// assert!(config.secondary().toggles.denoise);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestoreConfig {
    // ---- Identity / output ----
    pub codec: Codec,
    /// Rate-control value passed as `-crf`
    pub crf: f64,
    /// Encoder speed preset passed as `-preset`
    pub encoder_preset: String,
    pub fps: FrameRate,
    pub scale_factor: f64,
    /// Output directory; `None` writes next to the input
    pub output_dir: Option<PathBuf>,
    pub movflags: String,
    pub audio_bitrate: String,
    pub threads: Option<u32>,
    pub use_10bit: bool,
    pub hwaccel: HwAccel,
    pub encoder: Encoder,

    // ---- Upscaler ----
    pub scaler: Scaler,
    pub ai: AiSettings,
    pub mi_mode: MiMode,

    // ---- Restoration passes (primary, secondary) ----
    pub passes: [RestorationPass; 2],

    // ---- Kill-switches ----
    pub disabled: DisabledStages,
    /// Forces 8-bit 4:2:0 output everywhere
    pub pci_safe_mode: bool,

    pub color: ColorSettings,
    /// Extra libx265 parameters, comma- or colon-delimited
    pub x265_params: String,
    /// Adds a live preview branch to the filter graph
    pub preview: bool,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            codec: Codec::default(),
            crf: DEFAULT_CRF,
            encoder_preset: DEFAULT_ENCODER_PRESET.to_string(),
            fps: FrameRate::default(),
            scale_factor: DEFAULT_SCALE_FACTOR,
            output_dir: None,
            movflags: DEFAULT_MOVFLAGS.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            threads: None,
            use_10bit: false,
            hwaccel: HwAccel::default(),
            encoder: Encoder::default(),
            scaler: Scaler::default(),
            ai: AiSettings::default(),
            mi_mode: MiMode::default(),
            passes: [RestorationPass::primary(), RestorationPass::secondary()],
            disabled: DisabledStages::default(),
            pci_safe_mode: false,
            color: ColorSettings::default(),
            x265_params: DEFAULT_X265_PARAMS.to_string(),
            preview: false,
        }
    }
}

impl RestoreConfig {
    /// Starts a builder from the defaults.
    pub fn builder() -> RestoreConfigBuilder {
        RestoreConfigBuilder::new()
    }

    /// Returns the restoration pass at the given position.
    pub fn pass(&self, pass: Pass) -> &RestorationPass {
        &self.passes[pass.index()]
    }

    pub fn pass_mut(&mut self, pass: Pass) -> &mut RestorationPass {
        &mut self.passes[pass.index()]
    }

    pub fn primary(&self) -> &RestorationPass {
        self.pass(Pass::Primary)
    }

    pub fn secondary(&self) -> &RestorationPass {
        self.pass(Pass::Secondary)
    }

    /// Checks the invariants the compiler relies on.
    ///
    /// Values that entered through [`RestoreConfig::apply_setting`] already
    /// satisfy these. Records deserialized from JSON or assembled in code do
    /// not, so the numeric domains are enforced again here.
    pub fn validate(&self) -> CoreResult<()> {
        let finite_non_negative = [
            ("crf", self.crf),
            ("scale_factor", self.scale_factor),
            ("eq_contrast", self.color.contrast),
            ("eq_saturation", self.color.saturation),
        ];
        for (name, value) in finite_non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::InvalidOptions(format!(
                    "{name} must be a finite, non-negative number (got {value})"
                )));
            }
        }

        if self.crf > MAX_CRF {
            return Err(CoreError::InvalidOptions(format!(
                "crf must be at most {MAX_CRF} (got {})",
                self.crf
            )));
        }

        if self.scale_factor == 0.0 || self.scale_factor > MAX_SCALE_FACTOR {
            return Err(CoreError::InvalidOptions(format!(
                "scale_factor must be greater than zero and at most {MAX_SCALE_FACTOR} (got {})",
                self.scale_factor
            )));
        }

        let (min, max) = BRIGHTNESS_RANGE;
        if !(min..=max).contains(&self.color.brightness) {
            return Err(CoreError::InvalidOptions(format!(
                "eq_brightness must be between {min} and {max} (got {})",
                self.color.brightness
            )));
        }

        if let FrameRate::Fixed(fps) = self.fps {
            if !fps.is_finite() || fps <= 0.0 {
                return Err(CoreError::InvalidOptions(format!(
                    "fps must be a positive number, 'source' or 'lock' (got {fps})"
                )));
            }
        }

        if self.encoder_preset.trim().is_empty() && self.encoder != Encoder::Vaapi {
            return Err(CoreError::InvalidOptions(
                "encoder preset must not be empty".to_string(),
            ));
        }

        if self.scaler == Scaler::Ai && self.ai.model_path.as_os_str().is_empty() {
            return Err(CoreError::InvalidOptions(
                "the AI scaler requires ai_model to name a model file".to_string(),
            ));
        }

        for pass in Pass::ALL {
            self.pass(pass).validate(pass)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = RestoreConfig::default();
        assert_eq!(config.codec, Codec::H264);
        assert_eq!(config.fps, FrameRate::Fixed(60.0));
        assert_eq!(config.scale_factor, 2.0);
        assert_eq!(config.audio_bitrate, "192k");
        assert_eq!(config.movflags, "+faststart");
        assert_eq!(config.x265_params, DEFAULT_X265_PARAMS);
        assert_eq!(config.primary().denoise.denoiser, Denoiser::Bm3d);
        assert!(config.primary().toggles.denoise);
        assert!(!config.secondary().toggles.denoise);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn knob_enums_accept_aliases_case_insensitively() {
        assert_eq!("HEVC".parse::<Codec>().unwrap(), Codec::Hevc);
        assert_eq!("hevc_nvenc".parse::<Encoder>().unwrap(), Encoder::Nvenc);
        assert_eq!("dnn_processing".parse::<AiBackend>().unwrap(), AiBackend::Dnn);
        assert!(matches!(
            "vp9".parse::<Codec>(),
            Err(CoreError::InvalidOptions(_))
        ));
    }

    #[test]
    fn validate_rejects_ai_scaler_without_model() {
        let mut config = RestoreConfig::default();
        config.scaler = Scaler::Ai;
        assert!(matches!(config.validate(), Err(CoreError::InvalidOptions(_))));

        config.ai.model_path = PathBuf::from("/models/espcn.pb");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_finite_numbers() {
        let mut config = RestoreConfig::default();
        config.scale_factor = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = RestoreConfig::default();
        config.fps = FrameRate::Fixed(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_round_trip_keeps_knob_spellings() {
        let mut config = RestoreConfig::default();
        config.fps = FrameRate::Lock;
        config.encoder = Encoder::Nvenc;

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"fps\":\"lock\""));
        assert!(json.contains("\"encoder\":\"nvenc\""));

        let parsed: RestoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn validate_rejects_out_of_domain_json() {
        let json = r#"{"passes":[{"grain":{"strength":-2.0},"sharpen":{"strength":-1.0}},{}]}"#;
        let parsed: RestoreConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.primary().grain.strength, -2.0);
        assert!(matches!(parsed.validate(), Err(CoreError::InvalidOptions(_))));

        let parsed: RestoreConfig = serde_json::from_str(r#"{"scale_factor":9.0}"#).unwrap();
        assert!(matches!(parsed.validate(), Err(CoreError::InvalidOptions(_))));

        let parsed: RestoreConfig = serde_json::from_str(
            r#"{"color":{"brightness":-1.5}}"#,
        )
        .unwrap();
        assert!(matches!(parsed.validate(), Err(CoreError::InvalidOptions(_))));

        let parsed: RestoreConfig = serde_json::from_str(
            r#"{"passes":[{},{"deband":{"f3kdb_range":300}}]}"#,
        )
        .unwrap();
        assert!(matches!(parsed.validate(), Err(CoreError::InvalidOptions(_))));

        let parsed: RestoreConfig = serde_json::from_str(
            r#"{"scale_factor":8.0,"passes":[{"sharpen":{"usm_amount":-2.0}},{}]}"#,
        )
        .unwrap();
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn json_missing_fields_fall_back_to_defaults() {
        let parsed: RestoreConfig = serde_json::from_str(r#"{"codec":"hevc"}"#).unwrap();
        assert_eq!(parsed.codec, Codec::Hevc);
        assert_eq!(parsed.crf, DEFAULT_CRF);
        assert_eq!(parsed.passes, RestoreConfig::default().passes);
    }
}
