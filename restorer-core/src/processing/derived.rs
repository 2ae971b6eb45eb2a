// ============================================================================
// restorer-core/src/processing/derived.rs
// ============================================================================
//
// DERIVED PARAMETERS: Human-facing knobs to filter coefficients
//
// Each restoration filter takes library-specific parameters. The user sets a
// single strength or threshold; the functions here expand it into the concrete
// values, substituting a default for non-positive input and clamping to the
// range the filter accepts. None of them can fail, and all of them are pure:
// the same input always yields the same filter text.

use crate::config::{DenoiseStrength, Denoiser};

// ---- Per-algorithm defaults and limits ----

pub const BM3D_DEFAULT_SIGMA: f64 = 2.5;
pub const BM3D_MAX_SIGMA: f64 = 20.0;

pub const HQDN3D_DEFAULT_STRENGTH: f64 = 4.0;
pub const HQDN3D_MIN_STRENGTH: f64 = 1.0;
pub const HQDN3D_MAX_STRENGTH: f64 = 10.0;

pub const NLMEANS_DEFAULT_STRENGTH: f64 = 1.0;
pub const NLMEANS_MIN_STRENGTH: f64 = 1.0;
pub const NLMEANS_MAX_STRENGTH: f64 = 30.0;

pub const ATADENOISE_DEFAULT_STRENGTH: f64 = 9.0;
pub const ATADENOISE_MIN_STRENGTH: f64 = 1.0;
pub const ATADENOISE_MAX_STRENGTH: f64 = 20.0;

pub const DERING_DEFAULT_STRENGTH: f64 = 0.5;
/// Cap on the dering luma-spatial coefficient. Applied after the other three
/// coefficients have been derived from the uncapped value.
pub const DERING_MAX_LUMA: f64 = 15.0;

pub const F3KDB_DIVISOR: f64 = 2000.0;
pub const F3KDB_DEFAULT_LUMA_THRESHOLD: f64 = 0.03;
pub const F3KDB_DEFAULT_CHROMA_THRESHOLD: f64 = 0.015;
pub const F3KDB_MIN_THRESHOLD: f64 = 0.001;
pub const F3KDB_MAX_THRESHOLD: f64 = 0.5;
pub const F3KDB_DEFAULT_RANGE: i32 = 16;

// Fixed coefficient ratios for the hqdn3d family.
const CHROMA_RATIO: f64 = 0.75;
const TEMPORAL_RATIO: f64 = 1.5;

/// Returns `value` if it is a usable positive number, else `default`.
fn positive_or(value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        default
    }
}

/// Four hqdn3d coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hqdn3dParams {
    pub luma_spatial: f64,
    pub chroma_spatial: f64,
    pub luma_temporal: f64,
    pub chroma_temporal: f64,
}

impl Hqdn3dParams {
    /// Denoise strength to coefficients: base clamped to [1, 10], chroma 0.75x,
    /// temporal 1.5x.
    pub fn from_strength(strength: f64) -> Self {
        let luma_spatial = positive_or(strength, HQDN3D_DEFAULT_STRENGTH)
            .clamp(HQDN3D_MIN_STRENGTH, HQDN3D_MAX_STRENGTH);
        let luma_temporal = luma_spatial * TEMPORAL_RATIO;
        Self {
            luma_spatial,
            chroma_spatial: luma_spatial * CHROMA_RATIO,
            luma_temporal,
            chroma_temporal: luma_temporal * CHROMA_RATIO,
        }
    }

    /// Deringing is a tuned hqdn3d: luma is 8x the strength, the other three
    /// coefficients follow the usual ratios, and only luma is capped.
    pub fn for_dering(strength: f64) -> Self {
        let luma = positive_or(strength, DERING_DEFAULT_STRENGTH) * 8.0;
        let luma_temporal = luma * TEMPORAL_RATIO;
        Self {
            luma_spatial: luma.min(DERING_MAX_LUMA),
            chroma_spatial: luma * CHROMA_RATIO,
            luma_temporal,
            chroma_temporal: luma_temporal * CHROMA_RATIO,
        }
    }

    pub fn to_filter(&self) -> String {
        format!(
            "hqdn3d={:.2}:{:.2}:{:.2}:{:.2}",
            self.luma_spatial, self.chroma_spatial, self.luma_temporal, self.chroma_temporal
        )
    }
}

/// bm3d either estimates noise itself or runs with an explicit sigma.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bm3dParams {
    Estimate,
    Sigma(f64),
}

impl Bm3dParams {
    pub fn from_strength(strength: DenoiseStrength) -> Self {
        match strength {
            DenoiseStrength::Auto => Bm3dParams::Estimate,
            DenoiseStrength::Value(sigma) => {
                Bm3dParams::Sigma(positive_or(sigma, BM3D_DEFAULT_SIGMA).min(BM3D_MAX_SIGMA))
            }
        }
    }

    pub fn to_filter(&self) -> String {
        match self {
            Bm3dParams::Estimate => "bm3d=estim=final:planes=1".to_string(),
            Bm3dParams::Sigma(sigma) => format!("bm3d=sigma={sigma:.2}:estim=basic:planes=1"),
        }
    }
}

/// Non-local means: strength plus bucketed patch and search sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NlmeansParams {
    pub strength: f64,
    pub patch_size: u32,
    pub research_size: u32,
}

impl NlmeansParams {
    pub fn from_strength(strength: f64) -> Self {
        let strength = positive_or(strength, NLMEANS_DEFAULT_STRENGTH)
            .clamp(NLMEANS_MIN_STRENGTH, NLMEANS_MAX_STRENGTH);

        let patch_size = if strength > 20.0 {
            15
        } else if strength > 15.0 {
            13
        } else if strength > 10.0 {
            11
        } else if strength > 5.0 {
            9
        } else {
            7
        };

        let research_size = if strength > 25.0 {
            25
        } else if strength > 20.0 {
            23
        } else if strength > 15.0 {
            21
        } else if strength > 10.0 {
            19
        } else if strength > 5.0 {
            17
        } else {
            15
        };

        Self {
            strength,
            patch_size,
            research_size,
        }
    }

    pub fn to_filter(&self) -> String {
        format!(
            "nlmeans=s={:.2}:p={}:r={}",
            self.strength, self.patch_size, self.research_size
        )
    }
}

/// Adaptive temporal averaging: threshold pair scaled from one strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtadenoiseParams {
    pub strength: f64,
    pub threshold_a: f64,
    pub threshold_b: f64,
}

impl AtadenoiseParams {
    pub fn from_strength(strength: f64) -> Self {
        let strength = positive_or(strength, ATADENOISE_DEFAULT_STRENGTH)
            .clamp(ATADENOISE_MIN_STRENGTH, ATADENOISE_MAX_STRENGTH);
        let ratio = strength / ATADENOISE_MAX_STRENGTH;
        Self {
            strength,
            threshold_a: 0.01 + ratio * 0.03,
            threshold_b: 0.02 + ratio * 0.06,
        }
    }

    pub fn to_filter(&self) -> String {
        format!(
            "atadenoise=s={:.2}:0a={:.3}:0b={:.3}",
            self.strength, self.threshold_a, self.threshold_b
        )
    }
}

/// Renders the denoise stage for the selected algorithm.
pub fn denoise_filter(denoiser: Denoiser, strength: DenoiseStrength) -> String {
    match denoiser {
        Denoiser::Bm3d => Bm3dParams::from_strength(strength).to_filter(),
        Denoiser::Hqdn3d => Hqdn3dParams::from_strength(strength.numeric()).to_filter(),
        Denoiser::Nlmeans => NlmeansParams::from_strength(strength.numeric()).to_filter(),
        Denoiser::Atadenoise => AtadenoiseParams::from_strength(strength.numeric()).to_filter(),
    }
}

/// Range-mode deband: Y and CbCr values rescaled to plane thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct F3kdbParams {
    pub luma_threshold: f64,
    pub chroma_threshold: f64,
    pub range: i32,
}

impl F3kdbParams {
    /// # Arguments
    ///
    /// * `range` - Pixel search range; non-positive means 16
    /// * `y` - Luma value on the 0-512 scale
    /// * `cbcr` - Chroma value on the same scale
    ///
    /// Only the luma threshold has a floor.
    pub fn new(range: i32, y: f64, cbcr: f64) -> Self {
        let rescale = |value: f64, default: f64| {
            if value.is_finite() && value > 0.0 {
                value / F3KDB_DIVISOR
            } else {
                default
            }
        };

        Self {
            luma_threshold: rescale(y, F3KDB_DEFAULT_LUMA_THRESHOLD)
                .clamp(F3KDB_MIN_THRESHOLD, F3KDB_MAX_THRESHOLD),
            chroma_threshold: rescale(cbcr, F3KDB_DEFAULT_CHROMA_THRESHOLD).min(F3KDB_MAX_THRESHOLD),
            range: if range < 1 { F3KDB_DEFAULT_RANGE } else { range },
        }
    }

    /// Both chroma planes share one threshold.
    pub fn to_filter(&self) -> String {
        format!(
            "deband=1thr={:.5}:2thr={:.5}:3thr={:.5}:range={}:blur=0",
            self.luma_threshold, self.chroma_threshold, self.chroma_threshold, self.range
        )
    }
}

/// Scale expression for one dimension that always lands on an even integer.
///
/// `trunc(d*f/2)*2` in ffmpeg's expression language.
pub fn even_dimension_expr(dimension: &str, factor: f64) -> String {
    format!("trunc({dimension}*{factor}/2)*2")
}

/// Evaluates [`even_dimension_expr`] for a concrete input size.
pub fn even_dimension(size: u32, factor: f64) -> u64 {
    let half = (f64::from(size) * factor / 2.0).trunc();
    if half.is_finite() && half > 0.0 {
        (half as u64) * 2
    } else {
        0
    }
}
