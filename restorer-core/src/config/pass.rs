// ============================================================================
// restorer-core/src/config/pass.rs
// ============================================================================
//
// RESTORATION PASSES: Per-pass restoration parameters
//
// A job carries two restoration passes. The primary pass runs every enabled
// category; the secondary pass runs only the categories whose toggle is set.
// Both passes share the same shape so the compiler can treat them uniformly.

use crate::error::{CoreError, CoreResult};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default bm3d sigma.
pub const DEFAULT_DENOISE_STRENGTH: f64 = 2.5;
pub const DEFAULT_DERING_STRENGTH: f64 = 0.5;
pub const DEFAULT_CAS_STRENGTH: f64 = 0.25;
pub const DEFAULT_USM_RADIUS: u32 = 5;
pub const DEFAULT_USM_AMOUNT: f64 = 1.0;
pub const DEFAULT_USM_THRESHOLD: f64 = 0.03;
pub const DEFAULT_DEBAND_STRENGTH: f64 = 0.015;
pub const DEFAULT_F3KDB_RANGE: i32 = 15;
pub const DEFAULT_F3KDB_Y: f64 = 64.0;
pub const DEFAULT_F3KDB_CBCR: f64 = 64.0;
pub const DEFAULT_GRAIN_STRENGTH: f64 = 1.0;

/// Largest f3kdb search range.
pub const MAX_F3KDB_RANGE: i32 = 255;
/// Amount range accepted by ffmpeg's `unsharp`.
pub const USM_AMOUNT_RANGE: (f64, f64) = (-2.0, 5.0);

knob_enum! {
    /// Denoise filter family.
    pub enum Denoiser ("denoiser") {
        #[default]
        Bm3d => "bm3d",
        Hqdn3d => "hqdn3d",
        Nlmeans => "nlmeans",
        Atadenoise => "atadenoise",
    }
}

knob_enum! {
    pub enum DeblockMode ("deblock_mode") {
        Weak => "weak",
        #[default]
        Strong => "strong",
    }
}

knob_enum! {
    pub enum SharpenMethod ("sharpen_method") {
        #[default]
        Cas => "cas",
        Unsharp => "unsharp" | "usm",
    }
}

knob_enum! {
    /// Debanding filter family. `Deband` is ffmpeg's plain `deband` filter;
    /// `F3kdb` drives the same filter with per-plane thresholds.
    pub enum DebandMethod ("deband_method") {
        #[default]
        Deband => "deband",
        Gradfun => "gradfun",
        F3kdb => "f3kdb",
    }
}

/// Position of a restoration pass in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Primary,
    Secondary,
}

impl Pass {
    pub const ALL: [Pass; 2] = [Pass::Primary, Pass::Secondary];

    pub fn index(self) -> usize {
        match self {
            Pass::Primary => 0,
            Pass::Secondary => 1,
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Primary => f.write_str("pass 1"),
            Pass::Secondary => f.write_str("pass 2"),
        }
    }
}

/// Denoise strength: a number, or `auto` to let bm3d estimate noise itself.
///
/// Non-bm3d denoisers treat `Auto` like a non-positive value and use their own
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DenoiseStrength {
    Auto,
    Value(f64),
}

impl Default for DenoiseStrength {
    fn default() -> Self {
        DenoiseStrength::Value(DEFAULT_DENOISE_STRENGTH)
    }
}

impl DenoiseStrength {
    /// Numeric strength, with `Auto` mapped to 0 so that derivation picks the
    /// per-denoiser default.
    pub fn numeric(self) -> f64 {
        match self {
            DenoiseStrength::Auto => 0.0,
            DenoiseStrength::Value(value) => value,
        }
    }
}

impl From<String> for DenoiseStrength {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("auto") {
            DenoiseStrength::Auto
        } else {
            DenoiseStrength::Value(super::parse_strength(&value))
        }
    }
}

impl From<DenoiseStrength> for String {
    fn from(value: DenoiseStrength) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DenoiseStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenoiseStrength::Auto => f.write_str("auto"),
            DenoiseStrength::Value(value) => write!(f, "{value}"),
        }
    }
}

/// Which restoration categories a pass runs.
///
/// `dering` has no global kill-switch; it is gated by its own `active` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageToggles {
    pub deblock: bool,
    pub dering: bool,
    pub denoise: bool,
    pub sharpen: bool,
    pub deband: bool,
    pub grain: bool,
}

impl StageToggles {
    pub const fn all(enabled: bool) -> Self {
        Self {
            deblock: enabled,
            dering: enabled,
            denoise: enabled,
            sharpen: enabled,
            deband: enabled,
            grain: enabled,
        }
    }
}

impl Default for StageToggles {
    fn default() -> Self {
        Self::all(true)
    }
}

/// Global kill-switches. A set switch removes the category from both passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisabledStages {
    pub deblock: bool,
    pub denoise: bool,
    pub decimate: bool,
    pub interpolate: bool,
    pub sharpen: bool,
    pub deband: bool,
    pub color_eq: bool,
    pub grain: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseSettings {
    pub denoiser: Denoiser,
    pub strength: DenoiseStrength,
}

impl Default for DenoiseSettings {
    fn default() -> Self {
        Self {
            denoiser: Denoiser::Bm3d,
            strength: DenoiseStrength::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeblockSettings {
    pub mode: DeblockMode,
    /// Optional threshold suffix appended verbatim (e.g. `alpha=0.1`)
    pub threshold: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeringSettings {
    pub active: bool,
    pub strength: f64,
}

impl Default for DeringSettings {
    fn default() -> Self {
        Self {
            active: false,
            strength: DEFAULT_DERING_STRENGTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharpenSettings {
    pub method: SharpenMethod,
    /// `cas` strength
    pub strength: f64,
    /// `unsharp` matrix size; odd, 3..=23
    pub usm_radius: u32,
    pub usm_amount: f64,
    /// Accepted but not emitted by the unsharp filter text
    pub usm_threshold: f64,
}

impl Default for SharpenSettings {
    fn default() -> Self {
        Self {
            method: SharpenMethod::Cas,
            strength: DEFAULT_CAS_STRENGTH,
            usm_radius: DEFAULT_USM_RADIUS,
            usm_amount: DEFAULT_USM_AMOUNT,
            usm_threshold: DEFAULT_USM_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebandSettings {
    pub method: DebandMethod,
    /// Threshold for `deband` and `gradfun`
    pub strength: f64,
    pub f3kdb_range: i32,
    pub f3kdb_y: f64,
    pub f3kdb_cbcr: f64,
}

impl Default for DebandSettings {
    fn default() -> Self {
        Self {
            method: DebandMethod::Deband,
            strength: DEFAULT_DEBAND_STRENGTH,
            f3kdb_range: DEFAULT_F3KDB_RANGE,
            f3kdb_y: DEFAULT_F3KDB_Y,
            f3kdb_cbcr: DEFAULT_F3KDB_CBCR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrainSettings {
    pub strength: f64,
}

impl Default for GrainSettings {
    fn default() -> Self {
        Self {
            strength: DEFAULT_GRAIN_STRENGTH,
        }
    }
}

/// One restoration pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestorationPass {
    pub toggles: StageToggles,
    pub deblock: DeblockSettings,
    pub dering: DeringSettings,
    pub denoise: DenoiseSettings,
    pub sharpen: SharpenSettings,
    pub deband: DebandSettings,
    pub grain: GrainSettings,
}

impl Default for RestorationPass {
    fn default() -> Self {
        Self::primary()
    }
}

impl RestorationPass {
    /// Primary pass defaults: every category toggled on.
    pub fn primary() -> Self {
        Self {
            toggles: StageToggles::all(true),
            deblock: DeblockSettings::default(),
            dering: DeringSettings::default(),
            denoise: DenoiseSettings::default(),
            sharpen: SharpenSettings::default(),
            deband: DebandSettings::default(),
            grain: GrainSettings::default(),
        }
    }

    /// Secondary pass defaults: same values as the primary pass, every
    /// category toggled off.
    pub fn secondary() -> Self {
        Self {
            toggles: StageToggles::all(false),
            ..Self::primary()
        }
    }

    /// Checks the same numeric domains that [`RestoreConfig::apply_setting`]
    /// enforces, for records that arrive whole (JSON files, presets).
    ///
    /// [`RestoreConfig::apply_setting`]: super::RestoreConfig::apply_setting
    pub(crate) fn validate(&self, pass: Pass) -> CoreResult<()> {
        let non_negative = [
            ("dering_strength", self.dering.strength),
            ("sharpen_strength", self.sharpen.strength),
            ("usm_threshold", self.sharpen.usm_threshold),
            ("deband_strength", self.deband.strength),
            ("f3kdb_y", self.deband.f3kdb_y),
            ("f3kdb_cbcr", self.deband.f3kdb_cbcr),
            ("grain_strength", self.grain.strength),
            ("denoise_strength", self.denoise.strength.numeric()),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::InvalidOptions(format!(
                    "{pass} {name} must be a finite, non-negative number (got {value})"
                )));
            }
        }

        let (min, max) = USM_AMOUNT_RANGE;
        let amount = self.sharpen.usm_amount;
        if !(min..=max).contains(&amount) {
            return Err(CoreError::InvalidOptions(format!(
                "{pass} usm_amount must be between {min} and {max} (got {amount})"
            )));
        }

        let range = self.deband.f3kdb_range;
        if !(0..=MAX_F3KDB_RANGE).contains(&range) {
            return Err(CoreError::InvalidOptions(format!(
                "{pass} f3kdb_range must be between 0 and {MAX_F3KDB_RANGE} (got {range})"
            )));
        }

        Ok(())
    }
}
