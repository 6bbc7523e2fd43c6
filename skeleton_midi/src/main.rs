//! Replay a skeleton recording through the mapper and print the events.
//!
//! ```text
//! skeleton_midi <recording.jsonl> [--config mapping.json]
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use skeleton_midi::{read_recording, MappingConfig, MidiEvent, Session};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut path:        Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = args.next(),
            _          => path = Some(arg),
        }
    }
    let Some(path) = path else {
        eprintln!("usage: skeleton_midi <recording.jsonl> [--config mapping.json]");
        std::process::exit(2);
    };

    let result = match config_path.as_deref() {
        Some(cfg_path) => load_config(Path::new(cfg_path)),
        None           => Ok(MappingConfig::default()),
    }
    .and_then(|config| replay(Path::new(&path), config));

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn replay(path: &Path, config: MappingConfig) -> anyhow::Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let frames = read_recording(BufReader::new(file))
        .with_context(|| format!("reading {}", path.display()))?;
    log::info!("{} frames from {}", frames.len(), path.display());

    let mut session = Session::new(config);
    let mut total = 0usize;

    for (i, frame) in frames.iter().enumerate() {
        let mut events: Vec<MidiEvent> = Vec::new();
        let reports = session.map_frame(frame, &mut events)
            .with_context(|| format!("frame {}", i))?;

        for r in &reports {
            if let Some(sel) = r.role_select {
                println!("frame {:>5}  user {}  CLAP {:?} → {}", i, r.user_id, sel.quadrant, sel.role);
            }
        }
        for ev in &events {
            println!("frame {:>5}  {}", i, ev);
        }
        total += events.len();
    }

    println!();
    println!("  {} frames, {} events, final focus: {}", frames.len(), total, session.focus_role());
    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<MappingConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    MappingConfig::from_json(&text).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_names_the_file() {
        let path = Path::new("no/such/mapping.json");
        let err = load_config(path).unwrap_err();
        assert!(format!("{:#}", err).starts_with("reading no/such/mapping.json: "), "{:#}", err);
    }

    #[test]
    fn bad_config_names_the_file_and_the_field() {
        let path = std::env::temp_dir().join(format!("skeleton_midi_cfg_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "clap_distance": -5.0 }"#).unwrap();
        let err = load_config(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        let text = format!("{:#}", err);
        assert!(text.contains("parsing") && text.contains("clap_distance"), "{}", text);
    }

    #[test]
    fn demo_recording_replays() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/clap_right.jsonl");
        replay(&path, MappingConfig::default()).unwrap();
    }
}
