use clap::Parser;
use restorer_cli::commands::run::build_engine;
use restorer_cli::{Cli, Commands, ConfigArgs, DirectoryPresetStore, build_config};
use restorer_core::config::{Codec, Encoder, FrameRate, Scaler};
use restorer_core::presets::{MemoryPresetStore, PresetStore};
use restorer_core::{CancellationFlag, MediaKind, RestoreConfig, StageKind, compile_filter_chain};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn config_args(cli: Cli) -> ConfigArgs {
    match cli.command {
        Commands::Run(args) => args.config,
        Commands::Config(args) => args.config,
        Commands::Info => panic!("expected a command with configuration"),
    }
}

#[test]
fn test_run_basic_args() -> Result<(), Box<dyn Error>> {
    let cli = Cli::try_parse_from(["restorer", "run", "tapes/", "--dry-run"])?;
    assert!(!cli.verbose);
    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.input_path, PathBuf::from("tapes/"));
            assert!(args.dry_run);
            assert!(args.log_dir.is_none());
            assert!(!args.headless);
        }
        other => panic!("expected run, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_run_requires_input() {
    assert!(Cli::try_parse_from(["restorer", "run"]).is_err());
}

#[test]
fn test_flags_map_onto_config() -> Result<(), Box<dyn Error>> {
    let cli = Cli::try_parse_from([
        "restorer", "run", "in.mkv", "-v",
        "--codec", "h264",
        "--crf", "20",
        "--encoder", "nvenc",
        "--fps", "source",
        "--scale", "3",
        "--use10",
        "--no-grain",
        "--output", "/tmp/restored",
    ])?;
    assert!(cli.verbose);

    let config = build_config(&config_args(cli), &MemoryPresetStore::new())?;
    assert_eq!(config.codec, Codec::H264);
    assert_eq!(config.crf, 20.0);
    assert_eq!(config.encoder, Encoder::Nvenc);
    assert_eq!(config.fps, FrameRate::Lock);
    assert_eq!(config.scale_factor, 3.0);
    assert!(config.use_10bit);
    assert!(config.disabled.grain);
    assert!(!config.disabled.deblock);
    assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/restored")));
    Ok(())
}

#[test]
fn test_ai_model_selects_ai_scaler() -> Result<(), Box<dyn Error>> {
    let cli = Cli::try_parse_from(["restorer", "config", "--ai-model", "espcn.pb"])?;
    let config = build_config(&config_args(cli), &MemoryPresetStore::new())?;
    assert_eq!(config.scaler, Scaler::Ai);
    assert_eq!(config.ai.model_path, PathBuf::from("espcn.pb"));

    let cli = Cli::try_parse_from([
        "restorer", "config", "--ai-model", "espcn.pb", "--scaler", "zscale",
    ])?;
    let config = build_config(&config_args(cli), &MemoryPresetStore::new())?;
    assert_eq!(config.scaler, Scaler::Zscale);
    Ok(())
}

#[test]
fn test_set_overrides_flags_and_file() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("restore.json");
    fs::write(&file, r#"{ "crf": 22, "codec": "h264", "audio_bitrate": "copy" }"#)?;

    let cli = Cli::try_parse_from([
        "restorer", "config",
        "--config", file.to_str().ok_or("non-utf8 temp path")?,
        "--crf", "18",
        "--set", "crf=14",
        "--set", "use_deband_2=1",
    ])?;
    let config = build_config(&config_args(cli), &MemoryPresetStore::new())?;

    assert_eq!(config.codec, Codec::H264); // from the file
    assert_eq!(config.audio_bitrate, "copy");
    assert_eq!(config.crf, 14.0); // --set wins over --crf and the file
    assert!(config.secondary().toggles.deband);
    Ok(())
}

#[test]
fn test_unknown_set_key_is_rejected() -> Result<(), Box<dyn Error>> {
    let cli = Cli::try_parse_from(["restorer", "config", "--set", "warp_speed=9"])?;
    assert!(build_config(&config_args(cli), &MemoryPresetStore::new()).is_err());

    let cli = Cli::try_parse_from(["restorer", "config", "--set", "no-equals-sign"])?;
    assert!(build_config(&config_args(cli), &MemoryPresetStore::new()).is_err());
    Ok(())
}

#[test]
fn test_bad_enum_flag_is_rejected() -> Result<(), Box<dyn Error>> {
    let cli = Cli::try_parse_from(["restorer", "config", "--codec", "av1"])?;
    assert!(build_config(&config_args(cli), &MemoryPresetStore::new()).is_err());
    Ok(())
}

#[test]
fn test_invalid_config_file_is_an_error() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("broken.json");
    fs::write(&file, "{ not json")?;

    let cli = Cli::try_parse_from(["restorer", "config", "-c", file.to_str().ok_or("non-utf8 temp path")?])?;
    assert!(build_config(&config_args(cli), &MemoryPresetStore::new()).is_err());
    Ok(())
}

#[test]
fn test_preset_layer() -> Result<(), Box<dyn Error>> {
    let mut store = MemoryPresetStore::new();
    let vhs = RestoreConfig {
        crf: 24.0,
        ..RestoreConfig::default()
    };
    store.save("vhs", &vhs)?;

    let cli = Cli::try_parse_from(["restorer", "config", "--preset", "vhs", "--no-eq"])?;
    let config = build_config(&config_args(cli), &store)?;
    assert_eq!(config.crf, 24.0);
    assert!(config.disabled.color_eq);

    // Unknown presets keep the defaults.
    let cli = Cli::try_parse_from(["restorer", "config", "--preset", "missing"])?;
    let config = build_config(&config_args(cli), &store)?;
    assert_eq!(config.crf, RestoreConfig::default().crf);
    Ok(())
}

#[test]
fn test_named_preset_from_directory_changes_chain() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let preset_dir = dir.path().join("presets");
    let mut vhs = RestoreConfig {
        crf: 24.0,
        ..RestoreConfig::default()
    };
    vhs.disabled.color_eq = true;
    DirectoryPresetStore::new(&preset_dir).save("vhs", &vhs)?;
    let preset_dir_arg = preset_dir.to_str().ok_or("non-utf8 temp path")?;

    let cli = Cli::try_parse_from(["restorer", "run", "in.mkv", "--preset-dir", preset_dir_arg])?;
    let args = config_args(cli);
    let store = DirectoryPresetStore::resolve(args.preset_dir.as_deref());
    let plain = build_config(&args, &store)?;

    let cli = Cli::try_parse_from([
        "restorer", "run", "in.mkv", "--preset", "vhs", "--preset-dir", preset_dir_arg,
    ])?;
    let args = config_args(cli);
    let store = DirectoryPresetStore::resolve(args.preset_dir.as_deref());
    let named = build_config(&args, &store)?;
    assert_eq!(named.crf, 24.0);

    let plain_chain = compile_filter_chain(&plain, MediaKind::Video);
    let named_chain = compile_filter_chain(&named, MediaKind::Video);
    assert!(plain_chain.contains(StageKind::ColorEq, None));
    assert!(!named_chain.contains(StageKind::ColorEq, None));
    assert_ne!(plain_chain.render(), named_chain.render());
    Ok(())
}

#[test]
fn test_config_command_saves_preset() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let preset_dir = dir.path().to_str().ok_or("non-utf8 temp path")?;
    let cli = Cli::try_parse_from([
        "restorer", "config", "--crf", "19", "--save-preset", "archive", "--preset-dir", preset_dir,
    ])?;
    let Commands::Config(args) = cli.command else {
        panic!("expected config");
    };
    assert_eq!(args.save_preset.as_deref(), Some("archive"));
    restorer_cli::commands::show_config::run(&args)?;

    let store = DirectoryPresetStore::new(dir.path());
    assert_eq!(store.load("archive").ok_or("preset not saved")?.crf, 19.0);
    assert_eq!(store.names(), vec!["archive".to_string(), "factory".to_string()]);
    Ok(())
}

#[test]
fn test_dry_run_engine_reports_commands() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("scan.png");
    fs::write(&input, b"")?;
    let fake_ffmpeg = dir.path().join("ffmpeg");
    fs::write(&fake_ffmpeg, b"#!/bin/sh\n")?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&fake_ffmpeg, fs::Permissions::from_mode(0o755))?;
    }

    let cli = Cli::try_parse_from([
        "restorer", "run", input.to_str().ok_or("non-utf8 temp path")?, "--dry-run", "--headless",
    ])?;
    let Commands::Run(args) = cli.command else {
        panic!("expected run");
    };

    let config = build_config(&args.config, &MemoryPresetStore::new())?;
    let engine = build_engine(&args, CancellationFlag::new())
        .with_locator(restorer_core::external::locator::SystemLocator::empty().with_override(&fake_ffmpeg));
    let mut sink = restorer_core::progress_reporting::CollectingSink::default();

    let summary = engine.compile_and_run(&input, &config, &mut sink)?;
    assert_eq!(summary.reports.len(), 1);
    assert_eq!(summary.reports[0].invocation.program, fake_ffmpeg);
    assert!(summary.reports[0].invocation.has_arg("-frames:v"));
    assert_eq!(sink.started.len(), 1);
    Ok(())
}
