//! Top-level application state machine.
//!
//! `AppState` owns the mapping `Session`, the `ControlPanel` and the
//! `MidiOutput`.  It maps each incoming `SkeletonFrame`, applies panel
//! commands, and hands the visualizer what to draw each frame.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};
use std::time::Duration;

use anyhow::Context;
use skeleton_midi::{
    ClapState, MappingConfig, MappingError, MidiEvent, MidiSink, Session, SkeletonFrame, USER_SLOTS,
};

use crate::output::MidiOutput;
use crate::panel::{ControlPanel, PanelCommand, DEFAULT_ROLES, TEST_VALUE};
use crate::source::{spawn_skeleton_source, ReplaySource, SimSkeletonSource};
use crate::visualizer::{PreviewState, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Substring of the MIDI output port to open.
    pub port_hint:      String,
    pub mapping:        MappingConfig,
    /// Time between skeleton frames.
    pub frame_interval: Duration,
    /// Play this recording instead of the keyboard simulation.
    pub replay:         Option<PathBuf>,
    pub looping:        bool,
    pub role_names:     Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port_hint:      "kinect".to_string(),
            mapping:        MappingConfig::default(),
            frame_interval: Duration::from_millis(20),
            replay:         None,
            looping:        false,
            role_names:     DEFAULT_ROLES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    session: Session,
    panel:   ControlPanel,
    output:  MidiOutput,

    /// Most recent frame, kept for the preview.
    frame:   Option<SkeletonFrame>,
    frames:  usize,

    pub status: String,
}

impl AppState {
    /// Build the app and open the configured MIDI port.
    pub fn new(cfg: AppConfig) -> Self {
        let output = MidiOutput::open(&cfg.port_hint);
        AppState::with_output(cfg, output)
    }

    pub fn with_output(cfg: AppConfig, output: MidiOutput) -> Self {
        let status = match output.port_name() {
            Some(name) => format!("Ready. MIDI port: {}", name),
            None       => "Ready. No MIDI port, events are dropped".to_string(),
        };
        AppState {
            session: Session::new(cfg.mapping),
            panel:   ControlPanel::new(cfg.role_names, TEST_VALUE),
            output,
            frame:   None,
            frames:  0,
            status,
        }
    }

    // ── process one PanelCommand ──────────────────────────────────────────

    /// Returns `false` when the app should quit.
    pub fn handle_command(&mut self, cmd: PanelCommand) -> bool {
        match cmd {
            PanelCommand::SelectRole(role) => {
                self.panel.select_role(&mut self.session, role);
                self.status = format!("Focus: {} \"{}\"", role, self.panel.role_name(role));
            }
            PanelCommand::NextRole => {
                let role = self.panel.next_role(&mut self.session);
                self.status = format!("Focus: {} \"{}\"", role, self.panel.role_name(role));
            }
            PanelCommand::NextParam => {
                let i = self.panel.next_param();
                self.status = format!("Parameter: {}", self.panel.parameters()[i]);
            }
            PanelCommand::SendRole => {
                let event = self.panel.role_test_event(&self.session);
                self.send_test(event);
            }
            PanelCommand::SendParam => {
                let event = self.panel.param_test_event(&self.session);
                self.send_test(event);
            }
            PanelCommand::SendNote => {
                let event = self.panel.note_test_event(&self.session);
                self.send_test(event);
            }
            PanelCommand::Rename => {
                self.status = "Rename: type the new name in the terminal".to_string();
            }
            PanelCommand::Quit => return false,
        }
        true
    }

    fn send_test(&mut self, event: MidiEvent) {
        self.output.send(event);
        self.status = format!("Sent {}", event);
    }

    /// Rename the focused role.  Blank names keep the old one.
    pub fn rename_focused(&mut self, name: &str) {
        let role = self.session.focus_role();
        if self.panel.rename_focused(&self.session, name) {
            self.status = format!("Renamed {} to \"{}\"", role, self.panel.role_name(role));
        } else {
            self.status = format!("Kept name \"{}\"", self.panel.role_name(role));
        }
    }

    // ── process one SkeletonFrame ─────────────────────────────────────────

    /// Map every tracked user of `frame` to MIDI.
    ///
    /// A user id with no slot is an error the caller should not recover
    /// from.
    pub fn process_frame(&mut self, frame: SkeletonFrame) -> Result<(), MappingError> {
        let reports = self.session.map_frame(&frame, &mut self.output)?;
        self.frames += 1;

        for report in &reports {
            if let Some(sel) = report.role_select {
                self.status = format!(
                    "CLAP user {} {:?}: {} \"{}\"",
                    report.user_id, sel.quadrant, sel.role, self.panel.role_name(sel.role)
                );
            }
        }
        if !reports.is_empty() && self.frames % 250 == 0 {
            log::debug!("[app] {} frames, {} events sent", self.frames, self.output.sent());
        }

        self.frame = Some(frame);
        Ok(())
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn session(&self) -> &Session     { &self.session }
    pub fn panel(&self)   -> &ControlPanel { &self.panel }
    pub fn output(&self)  -> &MidiOutput   { &self.output }

    /// Clap latch per user slot; unseen users read as open.
    pub fn clapped(&self) -> [ClapState; USER_SLOTS] {
        std::array::from_fn(|i| self.session.clap_state(i as u16 + 1).unwrap_or_default())
    }

    pub fn preview(&self) -> PreviewState<'_> {
        PreviewState {
            frame:   self.frame.as_ref(),
            panel:   &self.panel,
            focus:   self.session.focus_role(),
            clapped: self.clapped(),
            port:    self.output.port_name(),
            last:    self.output.last(),
            status:  &self.status,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Creates the visualizer and the skeleton source (keyboard simulation, or
/// a recording with `replay`), then drives the frame/render loop at ~50 fps.
pub fn run(cfg: AppConfig) -> anyhow::Result<()> {
    // ── Skeleton source ───────────────────────────────────────────────────
    let (sim_tx, frame_rx) = match &cfg.replay {
        Some(path) => {
            let source = ReplaySource::open(path, cfg.frame_interval, cfg.looping)
                .with_context(|| format!("loading recording {}", path.display()))?;
            if source.is_empty() {
                log::warn!("[app] {} has no frames", path.display());
            }
            (None, spawn_skeleton_source(source))
        }
        None => {
            let (tx, rx) = mpsc::channel();
            let source = SimSkeletonSource { rx, interval: cfg.frame_interval };
            (Some(tx), spawn_skeleton_source(source))
        }
    };

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(sim_tx)
        .map_err(anyhow::Error::msg)
        .context("opening preview window")?;

    // ── App state ─────────────────────────────────────────────────────────
    let mut app = AppState::new(cfg);
    let mut source_done = false;

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        // 1. Panel commands
        for cmd in vis.poll_input() {
            if !app.handle_command(cmd) { return Ok(()); }
            if cmd == PanelCommand::Rename {
                // Blocks the window until the name is entered.
                let role = app.session().focus_role();
                let name = read_line(&format!("  New name for {}: ", role));
                app.rename_focused(&name);
            }
        }

        // 2. Drain skeleton frames
        loop {
            match frame_rx.try_recv() {
                Ok(frame) => app.process_frame(frame).context("mapping skeleton frame")?,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !source_done {
                        source_done = true;
                        log::info!("[app] skeleton source finished");
                        app.status = "Skeleton source finished".to_string();
                    }
                    break;
                }
            }
        }

        // 3. Render
        vis.render(&app.preview());
    }

    Ok(())
}

/// Print `prompt` on stdout and read one line from stdin.
pub fn read_line(prompt: &str) -> String {
    prompt_line(&mut io::stdin().lock(), &mut io::stdout(), prompt)
}

/// Write `prompt`, then read one line (newline included).  I/O errors
/// read as an empty answer.
pub fn prompt_line<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> String {
    write!(output, "{}", prompt).ok();
    output.flush().ok();
    let mut buf = String::new();
    input.read_line(&mut buf).ok();
    buf
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SimInput, SimKey, SimScene, SIM_CALIBRATION_FRAMES};
    use skeleton_midi::{Role, Skeleton, TrackedUser};

    fn make_app() -> AppState {
        AppState::with_output(AppConfig::default(), MidiOutput::null())
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut app = make_app();
        assert!(app.handle_command(PanelCommand::NextParam));
        assert!(!app.handle_command(PanelCommand::Quit));
    }

    #[test]
    fn send_role_uses_focused_role() {
        let mut app = make_app();
        app.handle_command(PanelCommand::SelectRole(Role::ALL[1]));
        app.handle_command(PanelCommand::SendRole);
        assert_eq!(app.output().last().map(|e| e.to_bytes()), Some([0xB4, 81, 50]));
    }

    #[test]
    fn send_param_follows_param_selection() {
        let mut app = make_app();
        app.handle_command(PanelCommand::NextRole);
        app.handle_command(PanelCommand::NextParam);
        app.handle_command(PanelCommand::NextParam);
        app.handle_command(PanelCommand::SendParam);
        assert_eq!(app.output().last().map(|e| e.to_bytes()), Some([0xB1, 3, 50]));
        assert_eq!(app.output().sent(), 1);
    }

    #[test]
    fn rename_changes_focused_role_only() {
        let mut app = make_app();
        app.handle_command(PanelCommand::SelectRole(Role::ALL[2]));
        app.rename_focused("pads\n");
        assert_eq!(app.panel().role_name(Role::ALL[2]), "pads");
        app.rename_focused("");
        assert_eq!(app.panel().role_name(Role::ALL[2]), "pads");
    }

    #[test]
    fn simulated_clap_moves_focus() {
        let mut app = make_app();
        let mut scene = SimScene::default();
        for _ in 0..=SIM_CALIBRATION_FRAMES {
            app.process_frame(scene.frame()).unwrap();
        }
        assert_eq!(app.output().sent(), 0);

        scene.apply(SimInput::KeyDown(SimKey::Clap));
        app.process_frame(scene.frame()).unwrap();

        assert_eq!(app.clapped()[0], ClapState::Clapped);
        assert_eq!(app.session().focus_role().index(), 2);
        assert!(app.status.starts_with("CLAP user 1"));
        // role select plus six arm controllers
        assert_eq!(app.output().sent(), 7);
    }

    #[test]
    fn unknown_user_id_is_an_error() {
        let mut app = make_app();
        let frame = SkeletonFrame { users: vec![TrackedUser::new(7, Skeleton::default())] };
        assert!(matches!(
            app.process_frame(frame),
            Err(MappingError::MissingUserSlot { user_id: 7, .. })
        ));
    }

    #[test]
    fn prompt_writes_prompt_and_reads_one_line() {
        let mut input = "bass\nlead\n".as_bytes();
        let mut shown = Vec::new();
        assert_eq!(prompt_line(&mut input, &mut shown, "name: "), "bass\n");
        assert_eq!(shown, b"name: ");
        assert_eq!(prompt_line(&mut input, &mut shown, ""), "lead\n");
        assert_eq!(prompt_line(&mut input, &mut shown, ""), "");
    }

    #[test]
    fn preview_reflects_state() {
        let mut app = make_app();
        app.handle_command(PanelCommand::SelectRole(Role::ALL[3]));
        let preview = app.preview();
        assert_eq!(preview.focus.index(), 3);
        assert!(preview.frame.is_none());
        assert!(preview.port.is_none());
        assert_eq!(preview.clapped, [ClapState::Open; USER_SLOTS]);
    }
}
