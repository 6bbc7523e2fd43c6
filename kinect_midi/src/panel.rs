//! Role and parameter panel.
//!
//! Holds the names shown in the side panel and builds the test messages
//! used to teach a synth's MIDI-learn which controller is which.  The
//! focused role itself lives in the [`Session`], so a clap and a panel
//! selection move the same focus.

use skeleton_midi::{MidiEvent, Role, Session, ROLE_COUNT};

/// Names shown for the four roles until the user renames them.
pub const DEFAULT_ROLES: [&str; ROLE_COUNT] = ["user1", "user2", "user3", "user4"];

/// Parameter list; entry `i` is controller `pose_base_controller + i`.
pub const PARAMETERS: [&str; 8] = [
    "left hand x",
    "left hand y",
    "left hand z",
    "right hand x",
    "right hand y",
    "right hand z",
    "head moving y",
    "body moving z",
];

/// Value sent by the "send MIDI" test buttons.
pub const TEST_VALUE: u8 = 50;

/// Note used by the note test.
pub const TEST_NOTE: u8 = 60;

// ════════════════════════════════════════════════════════════════════════════
// PanelCommand — what the preview window's keys ask for
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelCommand {
    /// Focus a role directly.
    SelectRole(Role),
    /// Focus the next role, wrapping.
    NextRole,
    /// Select the next parameter, wrapping.
    NextParam,
    /// Send the focused role's role-select controller at the test value.
    SendRole,
    /// Send the selected parameter's controller at the test value.
    SendParam,
    /// Send a test note on the focused role's channel.
    SendNote,
    /// Prompt for a new name for the focused role.
    Rename,
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// ControlPanel
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct ControlPanel {
    roles:          Vec<String>,
    selected_param: usize,
    test_value:     u8,
}

impl Default for ControlPanel {
    fn default() -> Self {
        ControlPanel::new(DEFAULT_ROLES.iter().map(|s| s.to_string()).collect(), TEST_VALUE)
    }
}

impl ControlPanel {
    /// `roles` is padded with the defaults (or truncated) to four names.
    pub fn new(mut roles: Vec<String>, test_value: u8) -> Self {
        roles.truncate(ROLE_COUNT);
        for name in DEFAULT_ROLES.iter().skip(roles.len()) {
            roles.push(name.to_string());
        }
        ControlPanel { roles, selected_param: 0, test_value: test_value.min(127) }
    }

    pub fn roles(&self) -> &[String] { &self.roles }
    pub fn parameters(&self) -> &'static [&'static str] { &PARAMETERS }
    pub fn selected_param(&self) -> usize { self.selected_param }

    pub fn role_name(&self, role: Role) -> &str {
        &self.roles[role.index()]
    }

    // ── selection ─────────────────────────────────────────────────────────

    /// Focus `role`, as clicking it in the role list would.
    pub fn select_role(&self, session: &mut Session, role: Role) {
        session.set_focus_role(role);
        log::info!("selected role {}: \"{}\"", role.index(), self.role_name(role));
    }

    /// Focus the role after the current one, wrapping around.
    pub fn next_role(&self, session: &mut Session) -> Role {
        let next = Role::ALL[(session.focus_role().index() + 1) % ROLE_COUNT];
        self.select_role(session, next);
        next
    }

    /// Out-of-range indices are ignored.
    pub fn select_param(&mut self, index: usize) {
        if index < PARAMETERS.len() {
            self.selected_param = index;
            log::info!("selected param {}: \"{}\"", index, PARAMETERS[index]);
        }
    }

    pub fn next_param(&mut self) -> usize {
        self.select_param((self.selected_param + 1) % PARAMETERS.len());
        self.selected_param
    }

    /// Rename the focused role.  Blank names are ignored.
    pub fn rename_focused(&mut self, session: &Session, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() { return false; }
        let idx = session.focus_role().index();
        self.roles[idx] = name.to_string();
        true
    }

    // ── test messages ─────────────────────────────────────────────────────

    /// Role-select controller for the focused role, at the test value.
    pub fn role_test_event(&self, session: &Session) -> MidiEvent {
        let cfg  = session.config();
        let role = session.focus_role();
        MidiEvent::control_change(
            cfg.role_select_channel,
            cfg.role_select_base_controller.saturating_add(role.index() as u8),
            self.test_value,
        )
    }

    /// The selected parameter's controller on the focused role's channel.
    pub fn param_test_event(&self, session: &Session) -> MidiEvent {
        MidiEvent::control_change(
            session.focus_role().channel(),
            session.config().pose_base_controller.saturating_add(self.selected_param as u8),
            self.test_value,
        )
    }

    /// A note on the focused role's channel, for checking the synth.
    pub fn note_test_event(&self, session: &Session) -> MidiEvent {
        MidiEvent::note_on(session.focus_role().channel(), TEST_NOTE, 100)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_are_padded_to_four() {
        let panel = ControlPanel::new(vec!["drums".into()], TEST_VALUE);
        assert_eq!(panel.roles(), &["drums", "user2", "user3", "user4"]);
    }

    #[test]
    fn selecting_a_role_moves_the_session_focus() {
        let panel = ControlPanel::default();
        let mut session = Session::default();
        panel.select_role(&mut session, Role::ALL[2]);
        assert_eq!(session.focus_role().index(), 2);
        assert_eq!(panel.next_role(&mut session).index(), 3);
        assert_eq!(panel.next_role(&mut session).index(), 0);
    }

    #[test]
    fn rename_applies_to_focused_role() {
        let mut panel = ControlPanel::default();
        let mut session = Session::default();
        panel.select_role(&mut session, Role::ALL[1]);
        assert!(panel.rename_focused(&session, "  bass  "));
        assert!(!panel.rename_focused(&session, "   "));
        assert_eq!(panel.role_name(Role::ALL[1]), "bass");
        assert_eq!(panel.role_name(Role::ALL[0]), "user1");
    }

    #[test]
    fn role_test_uses_role_select_block() {
        let panel = ControlPanel::default();
        let mut session = Session::default();
        panel.select_role(&mut session, Role::ALL[3]);
        assert_eq!(panel.role_test_event(&session).to_bytes(), [0xB4, 83, 50]);
    }

    #[test]
    fn param_test_uses_focused_channel() {
        let mut panel = ControlPanel::default();
        let mut session = Session::default();
        panel.select_role(&mut session, Role::ALL[2]);
        panel.select_param(4);
        assert_eq!(panel.param_test_event(&session).to_bytes(), [0xB2, 5, 50]);
    }

    #[test]
    fn param_selection_wraps_and_ignores_out_of_range() {
        let mut panel = ControlPanel::default();
        panel.select_param(99);
        assert_eq!(panel.selected_param(), 0);
        panel.select_param(7);
        assert_eq!(panel.next_param(), 0);
    }

    #[test]
    fn note_test_is_note_on() {
        let panel = ControlPanel::default();
        let session = Session::default();
        assert_eq!(panel.note_test_event(&session).to_bytes(), [0x90, 60, 100]);
    }
}
