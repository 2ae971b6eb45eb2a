// ============================================================================
// restorer-core/src/config/settings.rs
// ============================================================================
//
// SETTINGS TABLE: String-keyed edits of a RestoreConfig
//
// Front ends (the CLI `--set key=value` flag, JSON presets, GUIs) speak in
// string keys and string values. This module is the single place where those
// strings are turned into typed fields:
//
// - unknown keys and unknown enum spellings are rejected with InvalidOptions
// - numeric values that do not parse, or fall outside their domain, are
//   replaced by the field's default and a warning is logged
// - keys with a `_2` suffix address the secondary restoration pass, and
//   `use_<category>_2` flags toggle categories in that pass

use log::warn;
use std::path::PathBuf;

use super::pass::{
    DEFAULT_CAS_STRENGTH, DEFAULT_DEBAND_STRENGTH, DEFAULT_DERING_STRENGTH,
    DEFAULT_GRAIN_STRENGTH, DEFAULT_USM_AMOUNT, DEFAULT_USM_RADIUS, DEFAULT_USM_THRESHOLD,
    MAX_F3KDB_RANGE, USM_AMOUNT_RANGE,
};
use super::{
    BRIGHTNESS_RANGE, DEFAULT_AUDIO_BITRATE, DEFAULT_CRF, DEFAULT_EQ_BRIGHTNESS,
    DEFAULT_EQ_CONTRAST, DEFAULT_EQ_SATURATION, DEFAULT_FPS, DEFAULT_SCALE_FACTOR, DenoiseStrength,
    FrameRate, MAX_CRF, MAX_SCALE_FACTOR, Pass, RestorationPass, RestoreConfig,
};
use crate::error::{CoreError, CoreResult};

/// Odd matrix sizes accepted by ffmpeg's `unsharp`.
const USM_RADIUS_MIN: u32 = 3;
const USM_RADIUS_MAX: u32 = 23;

/// Parses a user-facing strength value.
///
/// Empty text, `auto`, anything unparseable, non-finite or negative values all
/// map to `0.0`, which the derivation functions read as "use the default".
pub fn parse_strength(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => 0.0,
    }
}

/// Parses a frame-rate value: a positive number, or `source`/`lock`.
pub(crate) fn parse_frame_rate(text: &str) -> FrameRate {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("source") || trimmed.eq_ignore_ascii_case("lock") {
        return FrameRate::Lock;
    }
    match trimmed.parse::<f64>() {
        Ok(fps) if fps.is_finite() && fps > 0.0 => FrameRate::Fixed(fps),
        _ => {
            warn!("Invalid fps '{text}', using {DEFAULT_FPS}");
            FrameRate::Fixed(DEFAULT_FPS)
        }
    }
}

/// Splits a `key=value` assignment as accepted by `--set`.
pub fn split_assignment(text: &str) -> CoreResult<(&str, &str)> {
    match text.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(CoreError::InvalidOptions(format!(
            "expected key=value, got '{text}'"
        ))),
    }
}

/// Accepted numeric domain for a field.
#[derive(Debug, Clone, Copy)]
enum Domain {
    /// Finite and within `min..=max`
    Between(f64, f64),
    /// Finite and >= 0
    NonNegative,
    /// Finite, > 0 and <= max
    PositiveUpTo(f64),
    /// Finite, >= 0 and <= max
    UpTo(f64),
}

impl Domain {
    fn contains(self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            Domain::Between(min, max) => (min..=max).contains(&value),
            Domain::NonNegative => value >= 0.0,
            Domain::PositiveUpTo(max) => value > 0.0 && value <= max,
            Domain::UpTo(max) => (0.0..=max).contains(&value),
        }
    }
}

fn number(key: &str, value: &str, default: f64, domain: Domain) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(parsed) if domain.contains(parsed) => parsed,
        _ => {
            warn!("Invalid value '{value}' for {key}, using default {default}");
            default
        }
    }
}

fn flag(key: &str, value: &str) -> CoreResult<bool> {
    let trimmed = value.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => return Ok(true),
        "false" | "no" | "off" | "" => return Ok(false),
        _ => {}
    }
    trimmed.parse::<i64>().map(|n| n != 0).map_err(|_| {
        CoreError::InvalidOptions(format!("{key} expects a boolean, got '{value}'"))
    })
}

fn optional_path(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

/// Clamps an unsharp matrix size into ffmpeg's accepted odd range.
pub(crate) fn clamp_usm_radius(radius: u32) -> u32 {
    let clamped = radius.clamp(USM_RADIUS_MIN, USM_RADIUS_MAX);
    if clamped % 2 == 0 { clamped + 1 } else { clamped }
}

fn usm_radius(key: &str, value: &str) -> u32 {
    let parsed = number(key, value, f64::from(DEFAULT_USM_RADIUS), Domain::NonNegative);
    clamp_usm_radius(parsed as u32)
}

/// f3kdb knobs keep 0 for unusable input so the deband derivation picks its
/// own defaults (range 16, thresholds 0.03 and 0.015).
fn f3kdb_value(key: &str, value: &str, max: f64) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && parsed > 0.0 => parsed.min(max),
        _ => {
            warn!("Invalid value '{value}' for {key}, using the deband default");
            0.0
        }
    }
}

fn f3kdb_range(key: &str, value: &str) -> i32 {
    f3kdb_value(key, value, f64::from(MAX_F3KDB_RANGE)).trunc() as i32
}

/// Applies a per-pass key (already stripped of any `_2` suffix).
///
/// Returns `Ok(false)` if the key is not a pass key.
fn apply_pass_setting(
    target: &mut RestorationPass,
    key: &str,
    full_key: &str,
    value: &str,
) -> CoreResult<bool> {
    match key {
        "denoiser" => target.denoise.denoiser = value.parse()?,
        "denoise_strength" => target.denoise.strength = DenoiseStrength::from(value.to_string()),
        "deblock_mode" => target.deblock.mode = value.parse()?,
        "deblock_thresh" => {
            let trimmed = value.trim();
            target.deblock.threshold = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        "dering_active" => target.dering.active = flag(full_key, value)?,
        "dering_strength" => {
            target.dering.strength =
                number(full_key, value, DEFAULT_DERING_STRENGTH, Domain::NonNegative)
        }
        "sharpen_method" => target.sharpen.method = value.parse()?,
        "sharpen_strength" => {
            target.sharpen.strength =
                number(full_key, value, DEFAULT_CAS_STRENGTH, Domain::NonNegative)
        }
        "usm_radius" => target.sharpen.usm_radius = usm_radius(full_key, value),
        "usm_amount" => {
            let (min, max) = USM_AMOUNT_RANGE;
            target.sharpen.usm_amount =
                number(full_key, value, DEFAULT_USM_AMOUNT, Domain::Between(min, max))
        }
        "usm_threshold" => {
            target.sharpen.usm_threshold =
                number(full_key, value, DEFAULT_USM_THRESHOLD, Domain::NonNegative)
        }
        "deband_method" => target.deband.method = value.parse()?,
        "deband_strength" => {
            target.deband.strength =
                number(full_key, value, DEFAULT_DEBAND_STRENGTH, Domain::NonNegative)
        }
        "f3kdb_range" => target.deband.f3kdb_range = f3kdb_range(full_key, value),
        "f3kdb_y" => target.deband.f3kdb_y = f3kdb_value(full_key, value, f64::MAX),
        "f3kdb_cbcr" => target.deband.f3kdb_cbcr = f3kdb_value(full_key, value, f64::MAX),
        "grain_strength" => {
            target.grain.strength =
                number(full_key, value, DEFAULT_GRAIN_STRENGTH, Domain::NonNegative)
        }
        _ => return Ok(false),
    }
    Ok(true)
}

impl RestoreConfig {
    /// Applies one `key = value` edit from the settings table.
    ///
    /// # Errors
    ///
    /// * `CoreError::InvalidOptions` for an unknown key, an unknown enum value,
    ///   or a boolean that is neither a word nor an integer
    pub fn apply_setting(&mut self, key: &str, value: &str) -> CoreResult<()> {
        let key = key.trim();

        if self.apply_global_setting(key, value)? {
            return Ok(());
        }

        if let Some(category) = key.strip_prefix("use_").and_then(|k| k.strip_suffix("_2")) {
            let enabled = flag(key, value)?;
            let toggles = &mut self.pass_mut(Pass::Secondary).toggles;
            match category {
                "deblock" => toggles.deblock = enabled,
                "dering" => toggles.dering = enabled,
                "denoise" => toggles.denoise = enabled,
                "sharpen" => toggles.sharpen = enabled,
                "deband" => toggles.deband = enabled,
                "grain" => toggles.grain = enabled,
                _ => {
                    return Err(CoreError::InvalidOptions(format!("unknown setting '{key}'")));
                }
            }
            return Ok(());
        }

        let (pass, pass_key) = match key.strip_suffix("_2") {
            Some(base) => (Pass::Secondary, base),
            None => (Pass::Primary, key),
        };
        if apply_pass_setting(self.pass_mut(pass), pass_key, key, value)? {
            return Ok(());
        }

        Err(CoreError::InvalidOptions(format!("unknown setting '{key}'")))
    }

    /// Applies a sequence of edits in order, stopping at the first error.
    pub fn apply_settings<'a, I>(&mut self, settings: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in settings {
            self.apply_setting(key, value)?;
        }
        Ok(())
    }

    fn apply_global_setting(&mut self, key: &str, value: &str) -> CoreResult<bool> {
        match key {
            "codec" => self.codec = value.parse()?,
            "crf" => self.crf = number(key, value, DEFAULT_CRF, Domain::UpTo(MAX_CRF)),
            "preset" => self.encoder_preset = value.trim().to_string(),
            "fps" => self.fps = parse_frame_rate(value),
            "scale_factor" => {
                self.scale_factor = number(
                    key,
                    value,
                    DEFAULT_SCALE_FACTOR,
                    Domain::PositiveUpTo(MAX_SCALE_FACTOR),
                )
            }
            "scaler" => self.scaler = value.parse()?,
            "ai_backend" => self.ai.backend = value.parse()?,
            "ai_model" => self.ai.model_path = PathBuf::from(value.trim()),
            "ai_model_type" => self.ai.model_type = value.parse()?,
            "dnn_backend" => self.ai.dnn_backend = value.trim().to_string(),
            "mi_mode" => self.mi_mode = value.parse()?,
            "eq_contrast" => {
                self.color.contrast = number(key, value, DEFAULT_EQ_CONTRAST, Domain::NonNegative)
            }
            "eq_brightness" => {
                let (min, max) = BRIGHTNESS_RANGE;
                self.color.brightness =
                    number(key, value, DEFAULT_EQ_BRIGHTNESS, Domain::Between(min, max))
            }
            "eq_saturation" => {
                self.color.saturation =
                    number(key, value, DEFAULT_EQ_SATURATION, Domain::NonNegative)
            }
            "lut3d_file" => self.color.lut3d_file = optional_path(value),
            "x265_params" => self.x265_params = value.trim().to_string(),
            "outdir" => self.output_dir = optional_path(value),
            "audio_bitrate" => {
                let trimmed = value.trim();
                self.audio_bitrate = if trimmed.is_empty() {
                    DEFAULT_AUDIO_BITRATE.to_string()
                } else {
                    trimmed.to_string()
                };
            }
            "movflags" => self.movflags = value.trim().to_string(),
            "threads" => {
                let trimmed = value.trim();
                self.threads = if trimmed.is_empty() {
                    None
                } else {
                    match trimmed.parse::<u32>() {
                        Ok(threads) => Some(threads),
                        Err(_) => {
                            warn!("Invalid value '{value}' for threads, letting ffmpeg decide");
                            None
                        }
                    }
                };
            }
            "hwaccel" => self.hwaccel = value.parse()?,
            "encoder" => self.encoder = value.parse()?,
            "use10" => self.use_10bit = flag(key, value)?,
            "preview" => self.preview = flag(key, value)?,
            "pci_safe_mode" => self.pci_safe_mode = flag(key, value)?,
            "no_deblock" => self.disabled.deblock = flag(key, value)?,
            "no_denoise" => self.disabled.denoise = flag(key, value)?,
            "no_decimate" => self.disabled.decimate = flag(key, value)?,
            "no_interpolate" => self.disabled.interpolate = flag(key, value)?,
            "no_sharpen" => self.disabled.sharpen = flag(key, value)?,
            "no_deband" => self.disabled.deband = flag(key, value)?,
            "no_eq" => self.disabled.color_eq = flag(key, value)?,
            "no_grain" => self.disabled.grain = flag(key, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}
