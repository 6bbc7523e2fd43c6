//! Clap detection with hysteresis.
//!
//! Each user slot carries a two-state latch.  Bringing the hands closer
//! than the clap distance latches it and fires a single role selection;
//! the latch only opens again once the hands are strictly farther apart
//! than the same distance.  At exactly the threshold nothing changes.
//!
//! The role is chosen by where the clap happens relative to the
//! shoulders:
//!
//! | Hands' offset from shoulders | Controller | Role |
//! |---|---|---|
//! | x ≤ 0, y > 0 | 80 | 0 |
//! | x > 0, y > 0 | 81 | 1 |
//! | x ≤ 0, y ≤ 0 | 82 | 2 |
//! | x > 0, y ≤ 0 | 83 | 3 |

use nalgebra::Vector3;

use crate::config::MappingConfig;
use crate::midi::MidiEvent;
use crate::role::Role;
use crate::snapshot::TrackedUserSnapshot;

// ════════════════════════════════════════════════════════════════════════════
// ClapState — the latch
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClapState {
    #[default]
    Open,
    Clapped,
}

/// What a single [`ClapState::step`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClapTransition {
    /// No edge crossed.
    Hold,
    /// `Open → Clapped`.
    Latched,
    /// `Clapped → Open`.
    Released,
}

impl ClapState {
    /// Advance the latch for this frame's hand distance.
    ///
    /// A non-finite distance never crosses either edge.
    pub fn step(&mut self, hands_distance: f32, threshold: f32) -> ClapTransition {
        match *self {
            ClapState::Open if hands_distance < threshold => {
                *self = ClapState::Clapped;
                ClapTransition::Latched
            }
            ClapState::Clapped if hands_distance > threshold => {
                *self = ClapState::Open;
                ClapTransition::Released
            }
            _ => ClapTransition::Hold,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Quadrant
// ════════════════════════════════════════════════════════════════════════════

/// Where the hands met, seen from the shoulders' midpoint.  Positive x
/// is "right", positive y is "up"; zero falls on the left / lower side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quadrant {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

impl Quadrant {
    pub fn classify(offset: &Vector3<f32>) -> Quadrant {
        match (offset.x > 0.0, offset.y > 0.0) {
            (false, true)  => Quadrant::UpperLeft,
            (true,  true)  => Quadrant::UpperRight,
            (false, false) => Quadrant::LowerLeft,
            (true,  false) => Quadrant::LowerRight,
        }
    }

    pub fn role(self) -> Role {
        let index = match self {
            Quadrant::UpperLeft  => 0,
            Quadrant::UpperRight => 1,
            Quadrant::LowerLeft  => 2,
            Quadrant::LowerRight => 3,
        };
        Role::ALL[index]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RoleSelect — output of a clap
// ════════════════════════════════════════════════════════════════════════════

/// A clap that selected a role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleSelect {
    pub quadrant: Quadrant,
    pub role:     Role,
    pub event:    MidiEvent,
}

impl RoleSelect {
    pub fn new(quadrant: Quadrant, config: &MappingConfig) -> Self {
        let role = quadrant.role();
        let controller = config.role_select_base_controller.saturating_add(role.index() as u8);
        RoleSelect {
            quadrant,
            role,
            event: MidiEvent::control_change(
                config.role_select_channel,
                controller,
                config.role_select_value,
            ),
        }
    }
}

/// Run the clap latch for one user.  Returns a [`RoleSelect`] on the
/// frame the hands come together, `None` on every other frame.
pub fn detect_clap(snapshot: &mut TrackedUserSnapshot, config: &MappingConfig) -> Option<RoleSelect> {
    let distance = snapshot.hands_distance();
    match snapshot.clap.step(distance, config.clap_distance) {
        ClapTransition::Latched => {
            let quadrant = Quadrant::classify(&snapshot.hands_offset());
            log::debug!("clap latched at {:.1} mm in {:?}", distance, quadrant);
            Some(RoleSelect::new(quadrant, config))
        }
        ClapTransition::Released => {
            log::debug!("clap released at {:.1} mm", distance);
            None
        }
        ClapTransition::Hold => None,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::{Joint, JointKind, Skeleton};

    fn snapshot(lh: [f32; 3], rh: [f32; 3], ls: [f32; 3], rs: [f32; 3]) -> TrackedUserSnapshot {
        let sk = Skeleton::default()
            .with(JointKind::LeftHand,      Joint::at(lh[0], lh[1], lh[2]))
            .with(JointKind::RightHand,     Joint::at(rh[0], rh[1], rh[2]))
            .with(JointKind::LeftShoulder,  Joint::at(ls[0], ls[1], ls[2]))
            .with(JointKind::RightShoulder, Joint::at(rs[0], rs[1], rs[2]));
        let mut snap = TrackedUserSnapshot::default();
        snap.update(&sk);
        snap
    }

    #[test]
    fn latch_fires_once_per_crossing() {
        let mut state = ClapState::Open;
        let steps: Vec<_> = [150.0, 90.0, 95.0, 105.0, 80.0]
            .iter()
            .map(|&d| state.step(d, 100.0))
            .collect();
        assert_eq!(steps, vec![
            ClapTransition::Hold,
            ClapTransition::Latched,
            ClapTransition::Hold,
            ClapTransition::Released,
            ClapTransition::Latched,
        ]);
    }

    #[test]
    fn exact_threshold_holds_either_state() {
        let mut open = ClapState::Open;
        assert_eq!(open.step(100.0, 100.0), ClapTransition::Hold);
        assert_eq!(open, ClapState::Open);

        let mut clapped = ClapState::Clapped;
        assert_eq!(clapped.step(100.0, 100.0), ClapTransition::Hold);
        assert_eq!(clapped, ClapState::Clapped);
    }

    #[test]
    fn nan_distance_never_transitions() {
        let mut state = ClapState::Open;
        assert_eq!(state.step(f32::NAN, 100.0), ClapTransition::Hold);
        state = ClapState::Clapped;
        assert_eq!(state.step(f32::NAN, 100.0), ClapTransition::Hold);
    }

    #[test]
    fn quadrants_map_to_fixed_roles() {
        let q = |x, y| Quadrant::classify(&Vector3::new(x, y, 0.0));
        assert_eq!(q(10.0, 10.0).role().index(), 1);
        assert_eq!(q(10.0, -10.0).role().index(), 3);
        assert_eq!(q(-10.0, 10.0).role().index(), 0);
        assert_eq!(q(-10.0, -10.0).role().index(), 2);
        // zero goes to the "≤ 0" side on both axes
        assert_eq!(q(0.0, 0.0), Quadrant::LowerLeft);
    }

    #[test]
    fn centred_high_clap_selects_role_zero() {
        let mut snap = snapshot([-10.0, 60.0, 0.0], [10.0, 60.0, 0.0], [-50.0, 0.0, 0.0], [50.0, 0.0, 0.0]);
        let sel = detect_clap(&mut snap, &MappingConfig::default()).unwrap();
        assert_eq!(sel.quadrant, Quadrant::UpperLeft);
        assert_eq!(sel.role.index(), 0);
        assert_eq!(sel.event, MidiEvent::control_change(4, 80, 127));
        assert_eq!(snap.clap, ClapState::Clapped);
    }

    #[test]
    fn low_right_clap_uses_controller_83() {
        let mut snap = snapshot([40.0, -80.0, 0.0], [60.0, -80.0, 0.0], [-50.0, 0.0, 0.0], [50.0, 0.0, 0.0]);
        let sel = detect_clap(&mut snap, &MappingConfig::default()).unwrap();
        assert_eq!(sel.event.to_bytes(), [0xB4, 83, 127]);
    }

    #[test]
    fn hands_apart_do_not_select() {
        let mut snap = snapshot([-300.0, 0.0, 0.0], [300.0, 0.0, 0.0], [-50.0, 0.0, 0.0], [50.0, 0.0, 0.0]);
        assert!(detect_clap(&mut snap, &MappingConfig::default()).is_none());
        assert_eq!(snap.clap, ClapState::Open);
    }

    #[test]
    fn custom_config_moves_role_select_block() {
        let cfg = MappingConfig::default()
            .role_select_channel(9)
            .role_select_base_controller(20)
            .role_select_value(100);
        let sel = RoleSelect::new(Quadrant::LowerLeft, &cfg);
        assert_eq!(sel.event, MidiEvent::control_change(9, 22, 100));
    }
}
