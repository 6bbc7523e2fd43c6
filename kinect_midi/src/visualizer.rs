//! Software-rendered preview using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┬─────────────────┐
//! │                                              │  ROLES          │
//! │   depth preview                              │  > user1        │
//! │   (skeletons projected onto the image plane) │    user2  ...   │
//! │                                              │                 │
//! │                                              │  PARAMETERS     │
//! │                                              │  > left hand x  │
//! │                                              │    ...          │
//! ├──────────────────────────────────────────────┴─────────────────┤
//! │  status bar                                                    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use skeleton_midi::{
    Arm, ClapState, Joint, JointKind, MidiEvent, Role, Skeleton, SkeletonFrame, ROLE_COUNT, USER_SLOTS,
};

use crate::panel::{ControlPanel, PanelCommand};
use crate::source::{Direction, SimInput, SimKey};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const PREVIEW_W:   usize = 640;
pub const PREVIEW_H:   usize = 480;
const PANEL_W:         usize = 300;
pub const WIN_W:       usize = PREVIEW_W + PANEL_W;
pub const WIN_H:       usize = PREVIEW_H + 60;
const STATUS_Y:        usize = PREVIEW_H;
const ROW_H:           usize = 18;
const BG_COLOR:        u32   = 0xFF101018;
const PANEL_BG:        u32   = 0xFF16213E;
const TEXT_BG:         u32   = 0xFF0F3460;
const FOCUS_BG:        u32   = 0xFF2E5C8A;
const GRAY_COLOR:      u32   = 0xFF404040;
const CLAP_COLOR:      u32   = 0xFFFFD700;

/// Focal length in pixels for the 640×480 depth image.
const FOCAL_PX: f32 = 525.0;

/// Projected points farther than this from the image (in pixels) are
/// dropped, which keeps line drawing bounded.
const MAX_OFFSCREEN_PX: f32 = 4096.0;

/// Joints below this confidence are not drawn.
const MIN_CONFIDENCE: f32 = 0.4;

/// Overlay color per user slot.
const USER_COLORS: [u32; USER_SLOTS] = [0xFFFF4040, 0xFF40C0FF, 0xFF60E060, 0xFFE060E0];

/// Bones drawn for each skeleton.
const LIMBS: [(JointKind, JointKind); 16] = [
    (JointKind::Head,          JointKind::Neck),
    // upper body
    (JointKind::Neck,          JointKind::LeftShoulder),
    (JointKind::LeftShoulder,  JointKind::Torso),
    (JointKind::Torso,         JointKind::RightShoulder),
    (JointKind::RightShoulder, JointKind::Neck),
    // arms
    (JointKind::LeftHand,      JointKind::LeftElbow),
    (JointKind::LeftElbow,     JointKind::LeftShoulder),
    (JointKind::RightHand,     JointKind::RightElbow),
    (JointKind::RightElbow,    JointKind::RightShoulder),
    // lower body
    (JointKind::Torso,         JointKind::LeftHip),
    (JointKind::LeftHip,       JointKind::RightHip),
    (JointKind::RightHip,      JointKind::Torso),
    // legs
    (JointKind::LeftFoot,      JointKind::LeftKnee),
    (JointKind::LeftKnee,      JointKind::LeftHip),
    (JointKind::RightFoot,     JointKind::RightKnee),
    (JointKind::RightKnee,     JointKind::RightHip),
];

/// Project a sensor-space joint onto the preview image.
pub fn project(joint: &Joint) -> Option<(isize, isize)> {
    let p = joint.position;
    if !(p.z > 0.0) || !p.x.is_finite() || !p.y.is_finite() { return None; }
    let x = PREVIEW_W as f32 / 2.0 + p.x * FOCAL_PX / p.z;
    let y = PREVIEW_H as f32 / 2.0 - p.y * FOCAL_PX / p.z;
    // also rejects NaN from ∞ / ∞
    if !(x.abs() < MAX_OFFSCREEN_PX && y.abs() < MAX_OFFSCREEN_PX) { return None; }
    Some((x as isize, y as isize))
}

/// Overlay color for a limb: hidden below the confidence floor, grey
/// unless both ends are fully confident.
pub fn limb_color(a: &Joint, b: &Joint, user_color: u32) -> Option<u32> {
    if a.confidence <= MIN_CONFIDENCE || b.confidence <= MIN_CONFIDENCE {
        None
    } else if a.confidence < 1.0 || b.confidence < 1.0 {
        Some(GRAY_COLOR)
    } else {
        Some(user_color)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PreviewState — one frame's worth of things to draw
// ════════════════════════════════════════════════════════════════════════════

pub struct PreviewState<'a> {
    pub frame:   Option<&'a SkeletonFrame>,
    pub panel:   &'a ControlPanel,
    pub focus:   Role,
    /// Clap latch per user slot.
    pub clapped: [ClapState; USER_SLOTS],
    pub port:    Option<&'a str>,
    pub last:    Option<MidiEvent>,
    pub status:  &'a str,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    /// `None` when frames come from a recording.
    sim_tx: Option<Sender<SimInput>>,
}

impl Visualizer {
    pub fn new(sim_tx: Option<Sender<SimInput>>) -> Result<Self, String> {
        let mut window = Window::new(
            "Kinect MIDI controller",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(20))); // ~50fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll the keyboard: simulation keys go to the sim source, panel keys
    /// come back as commands.
    pub fn poll_input(&mut self) -> Vec<PanelCommand> {
        let mut cmds = Vec::new();
        if !self.window.is_open() {
            cmds.push(PanelCommand::Quit);
            return cmds;
        }

        let shift = self.window.is_key_down(Key::LeftShift)
                 || self.window.is_key_down(Key::RightShift);

        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        let held    = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        // ── panel ─────────────────────────────────────────────────────────
        if pressed(Key::Q) || pressed(Key::Escape) { cmds.push(PanelCommand::Quit); }
        for (i, key) in [Key::F1, Key::F2, Key::F3, Key::F4].into_iter().enumerate() {
            if pressed(key) { cmds.push(PanelCommand::SelectRole(Role::ALL[i])); }
        }
        if pressed(Key::Tab) { cmds.push(PanelCommand::NextRole); }
        if pressed(Key::P)   { cmds.push(PanelCommand::NextParam); }
        if pressed(Key::R)   { cmds.push(PanelCommand::SendRole); }
        if pressed(Key::M)   { cmds.push(PanelCommand::SendParam); }
        if pressed(Key::N)   { cmds.push(PanelCommand::SendNote); }
        if pressed(Key::E)   { cmds.push(PanelCommand::Rename); }

        // ── simulation ────────────────────────────────────────────────────
        let mut sim = Vec::new();
        let (up, down) = if shift {
            (Direction::Forward, Direction::Back)
        } else {
            (Direction::Up, Direction::Down)
        };

        if held(Key::W) { sim.push(SimKey::Move(Arm::Left, up)); }
        if held(Key::S) { sim.push(SimKey::Move(Arm::Left, down)); }
        if held(Key::A) { sim.push(SimKey::Move(Arm::Left, Direction::Out)); }
        if held(Key::D) { sim.push(SimKey::Move(Arm::Left, Direction::In)); }
        if held(Key::I) { sim.push(SimKey::Move(Arm::Right, up)); }
        if held(Key::K) { sim.push(SimKey::Move(Arm::Right, down)); }
        if held(Key::L) { sim.push(SimKey::Move(Arm::Right, Direction::Out)); }
        if held(Key::J) { sim.push(SimKey::Move(Arm::Right, Direction::In)); }
        if pressed(Key::C)    { sim.push(SimKey::Clap); }
        if pressed(Key::Key2) { sim.push(SimKey::SecondUser); }
        if pressed(Key::U)    { sim.push(SimKey::SwitchUser); }
        if cmds.contains(&PanelCommand::Quit) { sim.push(SimKey::Quit); }

        if let Some(tx) = &self.sim_tx {
            for key in sim {
                let _ = tx.send(SimInput::KeyDown(key));
            }
        }

        cmds
    }

    /// Render one frame.
    pub fn render(&mut self, state: &PreviewState) {
        self.buf.fill(BG_COLOR);

        // ── Preview ───────────────────────────────────────────────────────
        self.draw_floor_grid();
        if let Some(frame) = state.frame {
            for user in frame.tracked_users() {
                let slot  = (user.id as usize).wrapping_sub(1);
                let color = USER_COLORS.get(slot).copied().unwrap_or(0xFFFFFFFF);
                self.draw_skeleton(&user.skeleton, color);

                if state.clapped.get(slot) == Some(&ClapState::Clapped) {
                    self.draw_clap_marker(&user.skeleton);
                }
                if let Some((x, y)) = project(user.skeleton.get(JointKind::Head)) {
                    let label = format!("user {}", user.id);
                    self.draw_label(&label, (x - 14).max(0) as usize, (y - 16).max(0) as usize, color, 1);
                }
            }
        }

        // ── Panel ─────────────────────────────────────────────────────────
        self.fill_rect(PREVIEW_W, 0, PANEL_W, PREVIEW_H, PANEL_BG);
        self.draw_panel(state);

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, TEXT_BG);
        self.draw_label(state.status, 10, STATUS_Y + 10, 0xFFEEEEEE, 2);

        // ── Key legend ────────────────────────────────────────────────────
        self.draw_label(
            "WASD/IJKL=hands  shift=depth  C=clap  2=user2  U=switch  F1-F4/Tab=role  P=param  R/M/N=send  E=rename  Q=quit",
            10, WIN_H - 14, 0xFF888888, 1,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Skeleton overlay ──────────────────────────────────────────────────

    fn draw_skeleton(&mut self, skeleton: &Skeleton, color: u32) {
        for (a, b) in LIMBS {
            let (ja, jb) = (skeleton.get(a), skeleton.get(b));
            let Some(c) = limb_color(ja, jb, color) else { continue };
            let (Some(pa), Some(pb)) = (project(ja), project(jb)) else { continue };

            self.draw_line(pa, pb, c);
            let ca = if ja.confidence < 1.0 { GRAY_COLOR } else { color };
            let cb = if jb.confidence < 1.0 { GRAY_COLOR } else { color };
            self.draw_dot(pa, 2, ca);
            self.draw_dot(pb, 2, cb);
        }
    }

    fn draw_clap_marker(&mut self, skeleton: &Skeleton) {
        let (l, r) = (skeleton.get(JointKind::LeftHand), skeleton.get(JointKind::RightHand));
        let mid = Joint::new((l.position + r.position) / 2.0, 1.0);
        if let Some(p) = project(&mid) {
            self.draw_ring(p, 10, CLAP_COLOR);
            self.draw_ring(p, 11, CLAP_COLOR);
        }
    }

    fn draw_floor_grid(&mut self) {
        for y in (PREVIEW_H / 2..PREVIEW_H).step_by(40) {
            for x in 0..PREVIEW_W { self.set_pixel(x, y, 0xFF1C1C28); }
        }
        for x in (0..PREVIEW_W).step_by(40) {
            for y in PREVIEW_H / 2..PREVIEW_H { self.set_pixel(x, y, 0xFF1C1C28); }
        }
    }

    // ── Panel ─────────────────────────────────────────────────────────────

    fn draw_panel(&mut self, state: &PreviewState) {
        let x0 = PREVIEW_W + 10;
        let mut y = 12;

        self.draw_label("ROLES", x0, y, 0xFFFFD700, 2);
        y += ROW_H + 6;
        for i in 0..ROLE_COUNT {
            let focused = state.focus.index() == i;
            if focused { self.fill_rect(PREVIEW_W + 4, y - 3, PANEL_W - 8, ROW_H, FOCUS_BG); }
            let role  = Role::ALL[i];
            let label = format!("{} ch{} {}", if focused { ">" } else { " " }, role.channel(), state.panel.role_name(role));
            self.draw_label(&label, x0, y, 0xFFEEEEEE, 2);
            y += ROW_H;
        }

        y += 14;
        self.draw_label("PARAMETERS", x0, y, 0xFFFFD700, 2);
        y += ROW_H + 6;
        for (i, name) in state.panel.parameters().iter().enumerate() {
            let selected = state.panel.selected_param() == i;
            if selected { self.fill_rect(PREVIEW_W + 4, y - 3, PANEL_W - 8, ROW_H, FOCUS_BG); }
            let label = format!("{} cc{} {}", if selected { ">" } else { " " }, i + 1, name);
            self.draw_label(&label, x0, y, 0xFFCCCCCC, 2);
            y += ROW_H;
        }

        y += 14;
        let port = match state.port {
            Some(p) => format!("port: {}", p),
            None    => "port: none".to_string(),
        };
        self.draw_label(&port, x0, y, 0xFF88CC88, 1);
        y += 12;
        let last = match state.last {
            Some(e) => format!("last: {}", e),
            None    => "last: -".to_string(),
        };
        self.draw_label(&last, x0, y, 0xFF88CC88, 1);
        y += 18;

        // one box per user slot, lit while that user's hands are together
        self.draw_label("CLAP", x0, y, 0xFFFFD700, 1);
        for (i, clap) in state.clapped.iter().enumerate() {
            let bx = x0 + 40 + i * 30;
            let color = if *clap == ClapState::Clapped { CLAP_COLOR } else { GRAY_COLOR };
            self.fill_rect(bx, y - 2, 20, 10, color);
            self.draw_label(&(i + 1).to_string(), bx + 8, y, 0xFF000000, 1);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            for col in x..(x + w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    /// Like `set_pixel` but clipped to the preview area.
    fn plot(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < PREVIEW_W && (y as usize) < PREVIEW_H {
            self.buf[y as usize * WIN_W + x as usize] = color;
        }
    }

    /// Bresenham line.
    fn draw_line(&mut self, (x0, y0): (isize, isize), (x1, y1): (isize, isize), color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.plot(x, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    fn draw_dot(&mut self, (cx, cy): (isize, isize), r: isize, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r { self.plot(cx + dx, cy + dy, color); }
            }
        }
    }

    fn draw_ring(&mut self, (cx, cy): (isize, isize), r: isize, color: u32) {
        let steps = (r * 8).max(16);
        for i in 0..steps {
            let a = i as f32 / steps as f32 * std::f32::consts::TAU;
            self.plot(cx + (a.cos() * r as f32) as isize, cy + (a.sin() * r as f32) as isize, color);
        }
    }

    /// 3×5 bitmap font, drawn at `scale`× size.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32, scale: usize) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) == 0 { continue; }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            self.set_pixel(cx + col * scale + sx, y + row * scale + sy, color);
                        }
                    }
                }
            }
            cx += 4 * scale;
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c.to_ascii_lowercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '[' => [0b110, 0b100, 0b100, 0b100, 0b110],
        ']' => [0b011, 0b001, 0b001, 0b001, 0b011],
        '"' => [0b101, 0b101, 0b000, 0b000, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
