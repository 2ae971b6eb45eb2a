// restorer-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Restorer: ffmpeg-based upscaling and restoration",
    long_about = "Compiles a restoration configuration into an ffmpeg filter chain and runs it \
                  over a file or a directory of videos and images."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restores a video or image file, or every supported file in a directory
    Run(RunArgs),
    /// Prints the effective configuration as JSON without running anything
    Config(ShowConfigArgs),
    /// Shows which ffmpeg would be used and its version
    Info,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input file or directory
    #[arg(required = true, value_name = "INPUT_PATH")]
    pub input_path: PathBuf,

    /// Print the ffmpeg command for each file instead of running it
    #[arg(long)]
    pub dry_run: bool,

    /// Directory for a per-run log of ffmpeg's output
    #[arg(short, long, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Send the live preview to a null sink instead of opening a window
    #[arg(long)]
    pub headless: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args, Debug)]
pub struct ShowConfigArgs {
    /// Also save the effective configuration as a named preset
    #[arg(long, value_name = "NAME")]
    pub save_preset: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Everything that contributes to the configuration record.
///
/// Precedence, lowest first: built-in defaults, `--preset`, `--config`,
/// individual flags, then `--set` in the order given.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Start from a named preset instead of the defaults
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Directory of JSON presets (defaults to the per-user config directory)
    #[arg(long, value_name = "DIR", env = "RESTORER_PRESET_DIR")]
    pub preset_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Set any configuration key, e.g. --set denoise_strength=4 (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub settings: Vec<String>,

    /// Directory for restored files (defaults to next to each input)
    #[arg(short, long, value_name = "OUTPUT_DIR")]
    pub output: Option<PathBuf>,

    // --- Encoding ---
    /// Video codec: hevc or h264
    #[arg(long, value_name = "CODEC")]
    pub codec: Option<String>,

    /// Constant rate factor (0-63)
    #[arg(long, value_name = "CRF")]
    pub crf: Option<String>,

    /// Encoder speed preset, e.g. slow or p7
    #[arg(long, value_name = "PRESET")]
    pub encoder_preset: Option<String>,

    /// Encoder family: auto, nvenc, qsv or vaapi
    #[arg(long, value_name = "ENCODER")]
    pub encoder: Option<String>,

    /// Hardware-accelerated decoding: none, cuda, videotoolbox, qsv or vaapi
    #[arg(long, value_name = "HWACCEL")]
    pub hwaccel: Option<String>,

    /// Encode with a 10-bit pixel format
    #[arg(long)]
    pub use10: bool,

    /// Force 8-bit 4:2:0 output with broadcast-safe levels
    #[arg(long)]
    pub pci_safe: bool,

    /// Encoder threads
    #[arg(long, value_name = "N")]
    pub threads: Option<String>,

    /// AAC bitrate, or "copy" to pass audio through
    #[arg(long, value_name = "BITRATE")]
    pub audio_bitrate: Option<String>,

    // --- Geometry and timing ---
    /// Target frame rate, or "source" to keep the input rate
    #[arg(long, value_name = "FPS")]
    pub fps: Option<String>,

    /// Upscale factor (up to 8)
    #[arg(long, value_name = "FACTOR")]
    pub scale: Option<String>,

    /// Scaler: lanczos, zscale, ai or hw
    #[arg(long, value_name = "SCALER")]
    pub scaler: Option<String>,

    /// Model file for the AI scaler
    #[arg(long, value_name = "MODEL")]
    pub ai_model: Option<PathBuf>,

    // --- Restoration ---
    /// Denoiser for the first pass: bm3d, hqdn3d, nlmeans or atadenoise
    #[arg(long, value_name = "DENOISER")]
    pub denoiser: Option<String>,

    /// Denoise strength for the first pass, or "auto"
    #[arg(long, value_name = "STRENGTH")]
    pub denoise_strength: Option<String>,

    /// 3D LUT applied after color correction
    #[arg(long, value_name = "FILE")]
    pub lut3d: Option<PathBuf>,

    /// Split the output to a live preview
    #[arg(long)]
    pub preview: bool,

    // --- Kill-switches ---
    #[arg(long)]
    pub no_deblock: bool,
    #[arg(long)]
    pub no_denoise: bool,
    #[arg(long)]
    pub no_decimate: bool,
    #[arg(long)]
    pub no_interpolate: bool,
    #[arg(long)]
    pub no_sharpen: bool,
    #[arg(long)]
    pub no_deband: bool,
    #[arg(long)]
    pub no_eq: bool,
    #[arg(long)]
    pub no_grain: bool,
}

impl ConfigArgs {
    /// The individual flags as configuration settings, in a fixed order.
    pub fn flag_settings(&self) -> Vec<(&'static str, String)> {
        let mut settings = Vec::new();

        let valued = [
            ("codec", &self.codec),
            ("crf", &self.crf),
            ("preset", &self.encoder_preset),
            ("encoder", &self.encoder),
            ("hwaccel", &self.hwaccel),
            ("threads", &self.threads),
            ("audio_bitrate", &self.audio_bitrate),
            ("fps", &self.fps),
            ("scale_factor", &self.scale),
            ("scaler", &self.scaler),
            ("denoiser", &self.denoiser),
            ("denoise_strength", &self.denoise_strength),
        ];
        for (key, value) in valued {
            if let Some(value) = value {
                settings.push((key, value.clone()));
            }
        }

        let paths = [
            ("outdir", &self.output),
            ("ai_model", &self.ai_model),
            ("lut3d_file", &self.lut3d),
        ];
        for (key, path) in paths {
            if let Some(path) = path {
                settings.push((key, path.to_string_lossy().into_owned()));
            }
        }
        // A model without an explicit scaler means the AI scaler.
        if self.ai_model.is_some() && self.scaler.is_none() {
            settings.push(("scaler", "ai".to_string()));
        }

        let switches = [
            ("use10", self.use10),
            ("pci_safe_mode", self.pci_safe),
            ("preview", self.preview),
            ("no_deblock", self.no_deblock),
            ("no_denoise", self.no_denoise),
            ("no_decimate", self.no_decimate),
            ("no_interpolate", self.no_interpolate),
            ("no_sharpen", self.no_sharpen),
            ("no_deband", self.no_deband),
            ("no_eq", self.no_eq),
            ("no_grain", self.no_grain),
        ];
        settings.extend(
            switches
                .into_iter()
                .filter(|(_, on)| *on)
                .map(|(key, _)| (key, "1".to_string())),
        );

        settings
    }
}
