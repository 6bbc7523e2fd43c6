//! kinect_midi — interactive entry point.

use std::path::{Path, PathBuf};

use anyhow::Context;
use kinect_midi::app::{read_line, run, AppConfig};
use kinect_midi::panel::DEFAULT_ROLES;
use skeleton_midi::{MappingConfig, ROLE_COUNT};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Kinect MIDI — clap to pick a role, play with arms      ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut quick       = false;
    let mut looping     = false;
    let mut replay:      Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--quick"  => quick = true,
            "--loop"   => looping = true,
            "--replay" => replay = args.next().map(PathBuf::from),
            "--config" => config_path = args.next().map(PathBuf::from),
            other      => log::warn!("ignoring unknown argument {:?}", other),
        }
    }

    match &replay {
        Some(p) => println!("  Source: recording {}{}", p.display(), if looping { " (looping)" } else { "" }),
        None    => println!("  Source: keyboard simulation  (use --replay <file> for a recording)"),
    }
    println!();

    if let Err(e) = start(quick, replay, looping, config_path.as_deref()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn start(
    quick:       bool,
    replay:      Option<PathBuf>,
    looping:     bool,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let mapping = match config_path {
        Some(path) => load_config(path)?,
        None       => MappingConfig::default(),
    };

    let mut cfg = if quick {
        println!("  Quick-start: port \"kinect\", roles user1–user4\n");
        AppConfig::default()
    } else {
        configure_interactively()
    };
    cfg.mapping = mapping;
    cfg.replay  = replay;
    cfg.looping = looping;

    println!();
    println!("  Opening preview window…");
    println!();

    run(cfg)
}

fn load_config(path: &Path) -> anyhow::Result<MappingConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    MappingConfig::from_json(&text).with_context(|| format!("parsing {}", path.display()))
}

fn configure_interactively() -> AppConfig {
    let mut cfg = AppConfig::default();

    let hint = read_line("  MIDI port name contains (default \"kinect\"): ");
    if !hint.trim().is_empty() {
        cfg.port_hint = hint.trim().to_string();
    }

    println!("  Role names (enter keeps the default):");
    cfg.role_names = (0..ROLE_COUNT)
        .map(|i| {
            let name = read_line(&format!("    Role {} on channel {} (default {}): ", i, i, DEFAULT_ROLES[i]));
            match name.trim() {
                "" => DEFAULT_ROLES[i].to_string(),
                n  => n.to_string(),
            }
        })
        .collect();

    cfg
}
