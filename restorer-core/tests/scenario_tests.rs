// restorer-core/tests/scenario_tests.rs
//
// End-to-end planning of jobs through the public API. Nothing here spawns a
// process; every test inspects the compiled chain and argument vector.

use restorer_core::config::Pass;
use restorer_core::encoding::{EncodeSettings, PixelFormat};
use restorer_core::external::{NullPreview, SdlWindow};
use restorer_core::processing::{StageKind, compile_filter_chain, plan_job};
use restorer_core::{MediaKind, RestoreConfig, normalize_x265_params};
use std::path::Path;

const FFMPEG: &str = "/usr/bin/ffmpeg";

fn config_with(settings: &[(&str, &str)]) -> RestoreConfig {
    let mut config = RestoreConfig::default();
    config
        .apply_settings(settings.iter().copied())
        .expect("settings should apply");
    config
}

#[test]
fn scenario_a_default_video_with_kill_switches() {
    let config = config_with(&[
        ("no_deblock", "1"),
        ("no_denoise", "1"),
        ("no_sharpen", "1"),
        ("no_deband", "1"),
    ]);
    let plan = plan_job(Path::new(FFMPEG), Path::new("/media/tape.mkv"), &config, &NullPreview);
    let rendered = plan.chain.render();

    assert!(rendered.starts_with("format=yuv444p16le,"));
    assert!(rendered.ends_with(",format=yuv420p,limiter=min=16:max=235:planes=15,setsar=1"));
    assert!(!rendered.ends_with(','));
    assert!(!rendered.contains(",,"));
    for removed in ["deblock=", "bm3d=", "cas=", "deband="] {
        assert!(!rendered.contains(removed), "{removed} should be absent");
    }

    assert_eq!(plan.invocation.flag_value("-vf"), Some(rendered.as_str()));
    assert_eq!(plan.invocation.args.last().map(String::as_str), Some("/media/tape_[restored].mp4"));
}

#[test]
fn scenario_b_ten_bit_nvenc_hevc() {
    let config = config_with(&[("use10", "1"), ("encoder", "nvenc"), ("codec", "hevc")]);
    let settings = EncodeSettings::resolve(&config);

    assert_eq!(settings.pixel_format, PixelFormat::P010le);
    assert_eq!(settings.encoder_id, "hevc_nvenc");
    assert!(settings.hvc1_tag);
    assert_eq!(settings.x265_params, None);

    let plan = plan_job(Path::new(FFMPEG), Path::new("tape.mp4"), &config, &NullPreview);
    assert_eq!(plan.invocation.flag_value("-c:v"), Some("hevc_nvenc"));
    assert_eq!(plan.invocation.flag_value("-tag:v"), Some("hvc1"));
    assert_eq!(plan.invocation.flag_value("-pix_fmt"), Some("p010le"));
}

#[test]
fn scenario_c_safe_mode_overrides_ten_bit() {
    let config = config_with(&[("pci_safe_mode", "1"), ("use10", "1")]);
    assert_eq!(PixelFormat::select(&config), PixelFormat::Yuv420p);

    let rendered = compile_filter_chain(&config, MediaKind::Video).render();
    assert!(rendered.starts_with("format=yuv420p,"));
    assert!(rendered.contains("limiter=min=16:max=235"));
}

#[test]
fn scenario_d_image_input() {
    let config = RestoreConfig::default();
    let plan = plan_job(Path::new(FFMPEG), Path::new("scan.PNG"), &config, &NullPreview);

    assert_eq!(plan.media, MediaKind::Image);
    for kind in [
        StageKind::Decimate,
        StageKind::Interpolate,
        StageKind::OutputFormat,
        StageKind::RangeLimiter,
        StageKind::AspectRatio,
    ] {
        assert!(!plan.chain.contains(kind, None), "{kind:?} should be absent");
    }
    assert_eq!(plan.invocation.flag_value("-frames:v"), Some("1"));
    assert!(!plan.invocation.has_arg("-c:v"));
    assert!(plan.output.ends_with("scan_[restored].png"));
}

#[test]
fn scenario_e_live_preview() {
    let config = config_with(&[("preview", "1")]);
    let plan = plan_job(Path::new(FFMPEG), Path::new("/media/tape.mov"), &config, &SdlWindow::default());
    let args = &plan.invocation.args;

    let graph = plan.invocation.flag_value("-filter_complex").unwrap_or_default();
    assert!(graph.starts_with("[0:v]format="));
    assert!(graph.ends_with(",split=2[main][prev]"));
    assert!(!plan.invocation.has_arg("-vf"));

    let maps: Vec<&str> = args
        .iter()
        .enumerate()
        .filter(|(_, a)| *a == "-map")
        .filter_map(|(i, _)| args.get(i + 1).map(String::as_str))
        .collect();
    assert_eq!(maps, ["[main]", "0:a?", "[prev]"]);

    let output_at = args.iter().position(|a| a == "/media/tape_[restored].mp4").unwrap_or(usize::MAX);
    let preview_at = args.iter().position(|a| a == "[prev]").unwrap_or(0);
    assert!(output_at < preview_at, "preview branch follows the main output");
    assert_eq!(args.last().map(String::as_str), Some("Live Preview"));
}

#[test]
fn compiling_twice_is_identical() {
    let config = config_with(&[
        ("denoiser", "nlmeans"),
        ("denoise_strength", "7"),
        ("use_sharpen_2", "1"),
        ("sharpen_method_2", "unsharp"),
        ("deband_method", "f3kdb"),
        ("fps", "source"),
        ("preview", "1"),
    ]);
    let first = plan_job(Path::new(FFMPEG), Path::new("a.mkv"), &config, &NullPreview);
    let second = plan_job(Path::new(FFMPEG), Path::new("a.mkv"), &config, &NullPreview);

    assert_eq!(first.chain.render(), second.chain.render());
    assert_eq!(first.invocation, second.invocation);
}

#[test]
fn secondary_stage_present_iff_enabled_and_not_killed() {
    let categories = [
        ("deblock", "no_deblock", StageKind::Deblock),
        ("denoise", "no_denoise", StageKind::Denoise),
        ("sharpen", "no_sharpen", StageKind::Sharpen),
        ("deband", "no_deband", StageKind::Deband),
    ];

    for (category, kill_switch, kind) in categories {
        for enabled in [false, true] {
            for killed in [false, true] {
                let use_key = format!("use_{category}_2");
                let config = config_with(&[
                    (use_key.as_str(), if enabled { "1" } else { "0" }),
                    (kill_switch, if killed { "1" } else { "0" }),
                ]);
                let chain = compile_filter_chain(&config, MediaKind::Video);
                assert_eq!(
                    chain.contains(kind, Some(Pass::Secondary)),
                    enabled && !killed,
                    "{category}: enabled={enabled} killed={killed}"
                );
            }
        }
    }
}

#[test]
fn secondary_dering_needs_toggle_and_active_flag() {
    for (toggle, active) in [(false, false), (false, true), (true, false), (true, true)] {
        let config = config_with(&[
            ("use_dering_2", if toggle { "1" } else { "0" }),
            ("dering_active_2", if active { "1" } else { "0" }),
        ]);
        let chain = compile_filter_chain(&config, MediaKind::Video);
        assert_eq!(chain.contains(StageKind::Dering, Some(Pass::Secondary)), toggle && active);
    }
}

#[test]
fn upscale_dimensions_are_always_even() {
    use restorer_core::processing::derived::even_dimension;

    for factor in [0.5, 1.0, 1.333, 1.5, 2.0, 2.5, 3.0, 4.0, 7.77] {
        for size in [1u32, 2, 3, 239, 240, 241, 479, 480, 719, 1079, 1080, 4095] {
            let scaled = even_dimension(size, factor);
            assert_eq!(scaled % 2, 0, "{size} x {factor} gave {scaled}");
        }
    }

    for factor in ["1.5", "2", "3"] {
        let config = config_with(&[("scale_factor", factor)]);
        let rendered = compile_filter_chain(&config, MediaKind::Video).render();
        assert!(rendered.contains(&format!("trunc(iw*{factor}/2)*2")));
        assert!(rendered.contains(&format!("trunc(ih*{factor}/2)*2")));
    }
}

#[test]
fn x265_params_keep_deblock_pair_together() {
    assert_eq!(
        normalize_x265_params("aq-mode=3,psy-rd=2.0,deblock=-2,-2"),
        "aq-mode=3:psy-rd=2.0:deblock=-2,-2"
    );

    let plan = plan_job(Path::new(FFMPEG), Path::new("tape.mp4"), &RestoreConfig::default(), &NullPreview);
    assert_eq!(
        plan.invocation.flag_value("-x265-params"),
        Some("aq-mode=3:psy-rd=2.0:deblock=-2,-2")
    );
}

#[test]
fn out_of_range_strengths_fall_back_to_defaults() {
    let baseline = compile_filter_chain(&RestoreConfig::default(), MediaKind::Video).render();
    for bad in ["-3", "abc", "NaN", "inf", ""] {
        let config = config_with(&[("denoise_strength", bad)]);
        let rendered = compile_filter_chain(&config, MediaKind::Video).render();
        assert_eq!(rendered, baseline, "denoise_strength={bad:?}");
    }
}

fn f3kdb_filter(settings: &[(&str, &str)]) -> String {
    let mut all = vec![("deband_method", "f3kdb")];
    all.extend_from_slice(settings);
    compile_filter_chain(&config_with(&all), MediaKind::Image)
        .stages()
        .iter()
        .find(|stage| stage.kind == StageKind::Deband)
        .map(|stage| stage.filter.clone())
        .unwrap_or_default()
}

#[test]
fn f3kdb_boundaries_use_deband_defaults() {
    for bad in ["-3", "0", "abc", ""] {
        let range = f3kdb_filter(&[("f3kdb_range", bad)]);
        assert!(range.ends_with(":range=16:blur=0"), "f3kdb_range={bad:?}: {range}");

        let luma = f3kdb_filter(&[("f3kdb_y", bad)]);
        assert!(luma.starts_with("deband=1thr=0.03000:"), "f3kdb_y={bad:?}: {luma}");

        let chroma = f3kdb_filter(&[("f3kdb_cbcr", bad)]);
        assert!(chroma.contains(":2thr=0.01500:3thr=0.01500:"), "f3kdb_cbcr={bad:?}: {chroma}");
    }

    assert_eq!(
        f3kdb_filter(&[("f3kdb_y", "5000"), ("f3kdb_cbcr", "5000"), ("f3kdb_range", "999")]),
        "deband=1thr=0.50000:2thr=0.50000:3thr=0.50000:range=255:blur=0"
    );
    assert_eq!(
        f3kdb_filter(&[("f3kdb_y", "1"), ("f3kdb_cbcr", "1")]),
        "deband=1thr=0.00100:2thr=0.00050:3thr=0.00050:range=15:blur=0"
    );
}

#[test]
fn audio_passthrough_copies_stream() {
    let config = config_with(&[("audio_bitrate", "copy")]);
    let plan = plan_job(Path::new(FFMPEG), Path::new("tape.mp4"), &config, &NullPreview);
    assert_eq!(plan.invocation.flag_value("-c:a"), Some("copy"));
    assert!(!plan.invocation.has_arg("-b:a"));
}
