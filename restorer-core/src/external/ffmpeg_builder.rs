//! FFmpeg argument vector assembly
//!
//! Turns a compiled filter chain and the job's configuration into the complete
//! ffmpeg invocation. Assembly is pure: it never touches the filesystem and
//! never fails, so dry runs and real runs see exactly the same arguments.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{AUDIO_PASSTHROUGH, HwAccel, RestoreConfig};
use crate::discovery::MediaKind;
use crate::encoding::EncodeSettings;
use crate::external::preview::PreviewSink;
use crate::processing::filter_chain::FilterChain;
use crate::utils::shell_quote;

/// Label of the encoded branch when the graph is split for preview.
const MAIN_LABEL: &str = "[main]";
/// Label of the preview branch.
const PREVIEW_LABEL: &str = "[prev]";

/// A fully assembled external-process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    /// Renders the invocation as one shell-quoted line, program first.
    #[must_use]
    pub fn display_command(&self) -> String {
        std::iter::once(shell_quote(&self.program.to_string_lossy()))
            .chain(self.args.iter().map(|arg| shell_quote(arg)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns the value following the first occurrence of `flag`.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|index| self.args.get(index + 1))
            .map(String::as_str)
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Builds a `std::process::Command` with the program and arguments set.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

/// Builder for ffmpeg argument vectors, section by section.
pub struct FfmpegCommandBuilder {
    program: PathBuf,
    args: Vec<String>,
}

impl FfmpegCommandBuilder {
    /// Starts an invocation with the global flags every job uses: no banner,
    /// errors only, periodic `-stats` lines, overwrite output.
    #[must_use]
    pub fn new(program: &Path) -> Self {
        let mut builder = Self {
            program: program.to_path_buf(),
            args: Vec::new(),
        };
        builder.push_all(["-hide_banner", "-loglevel", "error", "-stats", "-y"]);
        builder
    }

    fn push(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }

    fn push_all<'a>(&mut self, args: impl IntoIterator<Item = &'a str>) {
        self.args.extend(args.into_iter().map(str::to_string));
    }

    /// Adds `-hwaccel <name>` unless acceleration is off.
    #[must_use]
    pub fn with_hwaccel(mut self, hwaccel: HwAccel) -> Self {
        if hwaccel != HwAccel::None {
            self.push("-hwaccel");
            self.push(hwaccel.as_str());
        }
        self
    }

    #[must_use]
    pub fn with_input(mut self, input: &Path) -> Self {
        self.push("-i");
        self.push(input.to_string_lossy());
        self
    }

    /// Applies the chain as a simple `-vf` filter on the first video stream.
    #[must_use]
    pub fn with_video_filter(mut self, chain: &FilterChain) -> Self {
        self.push("-vf");
        self.push(chain.render());
        self.push_all(["-map", "0:v:0", "-map", "0:a?"]);
        self
    }

    /// Applies the chain inside a complex graph that splits into an encoded
    /// branch and a preview branch.
    #[must_use]
    pub fn with_split_preview_graph(mut self, chain: &FilterChain) -> Self {
        let rendered = chain.render();
        let head = if rendered.is_empty() {
            "[0:v]".to_string()
        } else {
            format!("[0:v]{rendered},")
        };
        self.push("-filter_complex");
        self.push(format!("{head}split=2{MAIN_LABEL}{PREVIEW_LABEL}"));
        self.push_all(["-map", MAIN_LABEL, "-map", "0:a?"]);
        self
    }

    /// Video encoder, pixel format, threads and rate control.
    #[must_use]
    pub fn with_video_encoding(mut self, settings: &EncodeSettings, config: &RestoreConfig) -> Self {
        self.push_all(["-c:v", settings.encoder_id]);
        if settings.hvc1_tag {
            self.push_all(["-tag:v", "hvc1"]);
        }
        self.push_all(["-pix_fmt", settings.pixel_format.as_str()]);
        if let Some(threads) = config.threads {
            self.push("-threads");
            self.push(threads.to_string());
        }
        if settings.rate_control {
            self.push("-preset");
            self.push(config.encoder_preset.clone());
            self.push("-crf");
            self.push(config.crf.to_string());
        }
        if let Some(params) = &settings.x265_params {
            self.push("-x265-params");
            self.push(params.clone());
        }
        self
    }

    /// AAC transcode at the configured bitrate, or stream copy for `copy`.
    #[must_use]
    pub fn with_audio(mut self, bitrate: &str) -> Self {
        if bitrate.eq_ignore_ascii_case(AUDIO_PASSTHROUGH) {
            self.push_all(["-c:a", "copy"]);
        } else {
            self.push_all(["-c:a", "aac", "-b:a"]);
            self.push(bitrate);
        }
        self
    }

    #[must_use]
    pub fn with_movflags(mut self, movflags: &str) -> Self {
        if !movflags.is_empty() {
            self.push("-movflags");
            self.push(movflags);
        }
        self
    }

    #[must_use]
    pub fn with_single_frame(mut self) -> Self {
        self.push_all(["-frames:v", "1"]);
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: &Path) -> Self {
        self.push(output.to_string_lossy());
        self
    }

    /// Appends the preview branch's own output after the main output.
    #[must_use]
    pub fn with_preview_output(mut self, sink: &dyn PreviewSink) -> Self {
        self.push_all(["-map", PREVIEW_LABEL]);
        self.args.extend(sink.output_args());
        self
    }

    #[must_use]
    pub fn build(self) -> Invocation {
        Invocation {
            program: self.program,
            args: self.args,
        }
    }
}

/// Assembles the full invocation for one job.
///
/// # Arguments
///
/// * `program` - Path of the ffmpeg binary
/// * `input` / `output` - Job paths
/// * `config` - The job's configuration
/// * `chain` - The compiled filter chain for this input
/// * `media` - Video jobs get encoder, audio and container flags; image jobs
///   request a single frame instead
/// * `preview` - Destination of the preview branch when `config.preview` is set
pub fn assemble_invocation(
    program: &Path,
    input: &Path,
    output: &Path,
    config: &RestoreConfig,
    chain: &FilterChain,
    media: MediaKind,
    preview: &dyn PreviewSink,
) -> Invocation {
    let mut builder = FfmpegCommandBuilder::new(program)
        .with_hwaccel(config.hwaccel)
        .with_input(input);

    builder = if config.preview {
        builder.with_split_preview_graph(chain)
    } else {
        builder.with_video_filter(chain)
    };

    builder = match media {
        MediaKind::Video => builder
            .with_video_encoding(&EncodeSettings::resolve(config), config)
            .with_audio(&config.audio_bitrate)
            .with_movflags(&config.movflags),
        MediaKind::Image => builder.with_single_frame(),
    };

    builder = builder.with_output(output);

    if config.preview {
        builder = builder.with_preview_output(preview);
    }

    builder.build()
}
