// ============================================================================
// restorer-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for RestoreConfig
//
// Fluent construction of a RestoreConfig for library callers that do not go
// through the string-keyed settings table. `build` validates the result.

use std::path::PathBuf;

use super::{
    Codec, DebandMethod, Denoiser, DenoiseStrength, Encoder, FrameRate, HwAccel, Pass,
    RestoreConfig, Scaler, SharpenMethod,
};
use crate::error::CoreResult;

/// Builder for creating RestoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use restorer_core::config::{Codec, Denoiser, Pass, RestoreConfigBuilder};
/// use std::path::PathBuf;
///
/// let config = RestoreConfigBuilder::new()
///     .codec(Codec::Hevc)
///     .crf(18.0)
///     .output_dir(PathBuf::from("/tmp/restored"))
///     .denoiser(Pass::Primary, Denoiser::Nlmeans)
///     .enable_secondary_denoise(true)
///     .build()
///     .unwrap();
///
/// assert!(config.secondary().toggles.denoise);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RestoreConfigBuilder {
    config: RestoreConfig,
}

impl RestoreConfigBuilder {
    /// Creates a builder seeded with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder seeded with an existing configuration, such as a
    /// loaded preset.
    pub fn from_config(config: RestoreConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn codec(mut self, codec: Codec) -> Self {
        self.config.codec = codec;
        self
    }

    /// Sets the rate-control value.
    ///
    /// # Arguments
    ///
    /// * `crf` - Constant rate factor (0-51, lower is higher quality)
    ///
    /// # Returns
    ///
    /// * Self for method chaining
    #[must_use]
    pub fn crf(mut self, crf: f64) -> Self {
        self.config.crf = crf;
        self
    }

    #[must_use]
    pub fn encoder_preset(mut self, preset: &str) -> Self {
        self.config.encoder_preset = preset.to_string();
        self
    }

    #[must_use]
    pub fn fps(mut self, fps: FrameRate) -> Self {
        self.config.fps = fps;
        self
    }

    #[must_use]
    pub fn scale_factor(mut self, factor: f64) -> Self {
        self.config.scale_factor = factor;
        self
    }

    #[must_use]
    pub fn scaler(mut self, scaler: Scaler) -> Self {
        self.config.scaler = scaler;
        self
    }

    /// Selects the AI scaler and its model file.
    #[must_use]
    pub fn ai_model(mut self, model_path: PathBuf) -> Self {
        self.config.scaler = Scaler::Ai;
        self.config.ai.model_path = model_path;
        self
    }

    /// Sets the output directory.
    ///
    /// # Arguments
    ///
    /// * `output_dir` - Directory for restored files; defaults to the input's
    ///   parent directory when never set
    ///
    /// # Returns
    ///
    /// * Self for method chaining
    #[must_use]
    pub fn output_dir(mut self, output_dir: PathBuf) -> Self {
        self.config.output_dir = Some(output_dir);
        self
    }

    #[must_use]
    pub fn hwaccel(mut self, hwaccel: HwAccel) -> Self {
        self.config.hwaccel = hwaccel;
        self
    }

    #[must_use]
    pub fn encoder(mut self, encoder: Encoder) -> Self {
        self.config.encoder = encoder;
        self
    }

    #[must_use]
    pub fn use_10bit(mut self, enable: bool) -> Self {
        self.config.use_10bit = enable;
        self
    }

    #[must_use]
    pub fn pci_safe_mode(mut self, enable: bool) -> Self {
        self.config.pci_safe_mode = enable;
        self
    }

    #[must_use]
    pub fn preview(mut self, enable: bool) -> Self {
        self.config.preview = enable;
        self
    }

    #[must_use]
    pub fn threads(mut self, threads: u32) -> Self {
        self.config.threads = Some(threads);
        self
    }

    #[must_use]
    pub fn x265_params(mut self, params: &str) -> Self {
        self.config.x265_params = params.to_string();
        self
    }

    #[must_use]
    pub fn audio_bitrate(mut self, bitrate: &str) -> Self {
        self.config.audio_bitrate = bitrate.to_string();
        self
    }

    #[must_use]
    pub fn lut3d_file(mut self, path: PathBuf) -> Self {
        self.config.color.lut3d_file = Some(path);
        self
    }

    #[must_use]
    pub fn denoiser(mut self, pass: Pass, denoiser: Denoiser) -> Self {
        self.config.pass_mut(pass).denoise.denoiser = denoiser;
        self
    }

    #[must_use]
    pub fn denoise_strength(mut self, pass: Pass, strength: DenoiseStrength) -> Self {
        self.config.pass_mut(pass).denoise.strength = strength;
        self
    }

    #[must_use]
    pub fn sharpen_method(mut self, pass: Pass, method: SharpenMethod) -> Self {
        self.config.pass_mut(pass).sharpen.method = method;
        self
    }

    #[must_use]
    pub fn deband_method(mut self, pass: Pass, method: DebandMethod) -> Self {
        self.config.pass_mut(pass).deband.method = method;
        self
    }

    /// Activates deringing in the given pass with the given strength.
    #[must_use]
    pub fn dering(mut self, pass: Pass, strength: f64) -> Self {
        let target = self.config.pass_mut(pass);
        target.dering.active = true;
        target.dering.strength = strength;
        if pass == Pass::Secondary {
            target.toggles.dering = true;
        }
        self
    }

    #[must_use]
    pub fn enable_secondary_denoise(mut self, enable: bool) -> Self {
        self.config.pass_mut(Pass::Secondary).toggles.denoise = enable;
        self
    }

    #[must_use]
    pub fn enable_secondary_sharpen(mut self, enable: bool) -> Self {
        self.config.pass_mut(Pass::Secondary).toggles.sharpen = enable;
        self
    }

    #[must_use]
    pub fn enable_secondary_deband(mut self, enable: bool) -> Self {
        self.config.pass_mut(Pass::Secondary).toggles.deband = enable;
        self
    }

    /// Applies one string-keyed setting; see [`RestoreConfig::apply_setting`].
    pub fn setting(mut self, key: &str, value: &str) -> CoreResult<Self> {
        self.config.apply_setting(key, value)?;
        Ok(self)
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// * `CoreError::InvalidOptions` if the assembled record breaks an invariant
    pub fn build(self) -> CoreResult<RestoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
