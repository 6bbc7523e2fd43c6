//! Arm pose → controller values.
//!
//! Each hand is measured against its own shoulder and scaled by the arm's
//! bone length (hand→elbow plus elbow→shoulder), so a short and a tall
//! player reach the same controller range.  The left arm's X is mirrored
//! so that "out to the side" reads the same for either hand:
//!
//! ```text
//! leftX  = (shoulder.x − hand.x) / L · 127      rightX = (hand.x − shoulder.x) / L · 127
//! Y      = (hand.y − shoulder.y + L/2) / L · 127
//! Z      = (shoulder.z − hand.z) / L · 127
//! ```
//!
//! Values are rounded half away from zero and clamped to 0–127.  With the
//! hand level with the shoulder, Y is exactly 63.5 and rounds to 64.

use nalgebra::Vector3;

use crate::error::MappingError;
use crate::joint::TrackedJoint;
use crate::midi::{MidiEvent, MidiSink, DATA_MAX};
use crate::role::Role;
use crate::snapshot::TrackedUserSnapshot;

// ════════════════════════════════════════════════════════════════════════════
// Arm
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arm {
    Left,
    Right,
}

impl Arm {
    pub const BOTH: [Arm; 2] = [Arm::Left, Arm::Right];

    fn joints(self) -> (TrackedJoint, TrackedJoint, TrackedJoint) {
        match self {
            Arm::Left  => (TrackedJoint::LeftHand,  TrackedJoint::LeftElbow,  TrackedJoint::LeftShoulder),
            Arm::Right => (TrackedJoint::RightHand, TrackedJoint::RightElbow, TrackedJoint::RightShoulder),
        }
    }

    /// Offset of this arm's first controller from the pose base controller.
    fn controller_offset(self) -> u8 {
        match self {
            Arm::Left  => 0,
            Arm::Right => 3,
        }
    }
}

/// Hand → elbow → shoulder length; tolerant of a bent elbow.
pub fn arm_length(hand: &Vector3<f32>, elbow: &Vector3<f32>, shoulder: &Vector3<f32>) -> f32 {
    (hand - elbow).norm() + (elbow - shoulder).norm()
}

/// Round half away from zero and clamp into the 7-bit range.
pub fn cc_value(v: f32) -> u8 {
    if v.is_nan() { return 0; }
    v.round().clamp(0.0, DATA_MAX as f32) as u8
}

// ════════════════════════════════════════════════════════════════════════════
// ArmValues
// ════════════════════════════════════════════════════════════════════════════

/// Normalised controller values for one arm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArmValues {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl ArmValues {
    /// Normalise `arm` from the cached joint positions.
    ///
    /// Fails with [`MappingError::DegenerateArmLength`] when the bone
    /// length is zero or not finite, instead of dividing by it.
    pub fn from_snapshot(arm: Arm, snapshot: &TrackedUserSnapshot) -> Result<ArmValues, MappingError> {
        let (h, e, s) = arm.joints();
        let hand     = snapshot.position(h);
        let shoulder = snapshot.position(s);
        let length   = arm_length(&hand, &snapshot.position(e), &shoulder);

        if !length.is_finite() || length <= 0.0 {
            return Err(MappingError::DegenerateArmLength { arm, length });
        }

        let scale = |d: f32| cc_value(d / length * DATA_MAX as f32);
        let dx = match arm {
            Arm::Left  => shoulder.x - hand.x,
            Arm::Right => hand.x - shoulder.x,
        };

        Ok(ArmValues {
            x: scale(dx),
            y: scale(hand.y - shoulder.y + length / 2.0),
            z: scale(shoulder.z - hand.z),
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ArmPose — both arms
// ════════════════════════════════════════════════════════════════════════════

/// Both arms' values for a frame.  An arm that failed to normalise is
/// skipped on emission.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArmPose {
    pub left:  Result<ArmValues, MappingError>,
    pub right: Result<ArmValues, MappingError>,
}

impl ArmPose {
    pub fn from_snapshot(snapshot: &TrackedUserSnapshot) -> Self {
        ArmPose {
            left:  ArmValues::from_snapshot(Arm::Left, snapshot),
            right: ArmValues::from_snapshot(Arm::Right, snapshot),
        }
    }

    pub fn arm(&self, arm: Arm) -> &Result<ArmValues, MappingError> {
        match arm {
            Arm::Left  => &self.left,
            Arm::Right => &self.right,
        }
    }

    /// Controller events on `role`'s channel: leftX, leftY, leftZ, rightX,
    /// rightY, rightZ, minus any degenerate arm.
    pub fn events(&self, role: Role, base_controller: u8) -> Vec<MidiEvent> {
        let mut out = Vec::with_capacity(6);
        for arm in Arm::BOTH {
            match self.arm(arm) {
                Ok(v) => {
                    let first = base_controller.saturating_add(arm.controller_offset());
                    for (i, value) in [v.x, v.y, v.z].into_iter().enumerate() {
                        out.push(MidiEvent::control_change(
                            role.channel(),
                            first.saturating_add(i as u8),
                            value,
                        ));
                    }
                }
                Err(e) => log::debug!("skipping arm: {}", e),
            }
        }
        out
    }

    /// Emit [`ArmPose::events`] into `sink`; returns how many were sent.
    pub fn emit<S: MidiSink + ?Sized>(&self, role: Role, base_controller: u8, sink: &mut S) -> usize {
        let events = self.events(role, base_controller);
        let n = events.len();
        for ev in events {
            sink.send(ev);
        }
        n
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::{Joint, JointKind, Skeleton};

    fn snap(pairs: &[(JointKind, [f32; 3])]) -> TrackedUserSnapshot {
        let sk = pairs.iter().fold(Skeleton::default(), |sk, (k, p)| {
            sk.with(*k, Joint::at(p[0], p[1], p[2]))
        });
        let mut s = TrackedUserSnapshot::default();
        s.update(&sk);
        s
    }

    #[test]
    fn cc_value_rounds_half_away_and_clamps() {
        assert_eq!(cc_value(63.5), 64);
        assert_eq!(cc_value(63.49), 63);
        assert_eq!(cc_value(-3.0), 0);
        assert_eq!(cc_value(400.0), 127);
        assert_eq!(cc_value(f32::INFINITY), 127);
        assert_eq!(cc_value(f32::NAN), 0);
    }

    #[test]
    fn bent_arm_length_is_piecewise() {
        let l = arm_length(
            &Vector3::new(300.0, 0.0, 0.0),
            &Vector3::new(300.0, 400.0, 0.0),
            &Vector3::new(0.0, 400.0, 0.0),
        );
        assert!((l - 700.0).abs() < 1e-3);
    }

    #[test]
    fn hand_level_with_shoulder_gives_mid_y() {
        // Arm pointing straight forward (−z), hand at shoulder height.
        let s = snap(&[
            (JointKind::LeftShoulder, [0.0, 0.0, 0.0]),
            (JointKind::LeftElbow,    [0.0, 0.0, -300.0]),
            (JointKind::LeftHand,     [0.0, 0.0, -600.0]),
        ]);
        let v = ArmValues::from_snapshot(Arm::Left, &s).unwrap();
        assert_eq!(v.y, 64);
        assert_eq!(v.x, 0);
        assert_eq!(v.z, 127);
    }

    #[test]
    fn hanging_arm_clamps_y_to_zero() {
        let s = snap(&[
            (JointKind::LeftShoulder, [0.0, 0.0, 0.0]),
            (JointKind::LeftElbow,    [0.0, -300.0, 0.0]),
            (JointKind::LeftHand,     [0.0, -600.0, 0.0]),
        ]);
        let v = ArmValues::from_snapshot(Arm::Left, &s).unwrap();
        // (−600 + 300) / 600 · 127 = −63.5
        assert_eq!(v.y, 0);
    }

    #[test]
    fn raised_arm_clamps_y_to_max() {
        let s = snap(&[
            (JointKind::RightShoulder, [0.0, 0.0, 0.0]),
            (JointKind::RightElbow,    [0.0, 300.0, 0.0]),
            (JointKind::RightHand,     [0.0, 600.0, 0.0]),
        ]);
        let v = ArmValues::from_snapshot(Arm::Right, &s).unwrap();
        assert_eq!(v.y, 127);
    }

    #[test]
    fn left_and_right_x_are_mirrored() {
        // Both hands stretched half an arm outward.
        let s = snap(&[
            (JointKind::LeftShoulder,  [-200.0, 0.0, 0.0]),
            (JointKind::LeftElbow,     [-200.0, -200.0, 0.0]),
            (JointKind::LeftHand,      [-400.0, -200.0, 0.0]),
            (JointKind::RightShoulder, [200.0, 0.0, 0.0]),
            (JointKind::RightElbow,    [200.0, -200.0, 0.0]),
            (JointKind::RightHand,     [400.0, -200.0, 0.0]),
        ]);
        let pose = ArmPose::from_snapshot(&s);
        let (l, r) = (pose.left.unwrap(), pose.right.unwrap());
        assert_eq!(l.x, r.x);
        assert_eq!(l.x, 64); // 200 / 400 · 127 = 63.5
    }

    #[test]
    fn zero_length_arm_is_degenerate() {
        let s = snap(&[]);
        assert!(matches!(
            ArmValues::from_snapshot(Arm::Left, &s),
            Err(MappingError::DegenerateArmLength { arm: Arm::Left, .. })
        ));
    }

    #[test]
    fn non_finite_joint_is_degenerate() {
        let s = snap(&[
            (JointKind::RightShoulder, [0.0, 0.0, 0.0]),
            (JointKind::RightElbow,    [0.0, f32::NAN, 0.0]),
            (JointKind::RightHand,     [0.0, 600.0, 0.0]),
        ]);
        assert!(ArmValues::from_snapshot(Arm::Right, &s).is_err());
    }

    #[test]
    fn events_follow_fixed_controller_order() {
        let s = snap(&[
            (JointKind::LeftShoulder,  [-200.0, 0.0, 0.0]),
            (JointKind::LeftElbow,     [-200.0, -200.0, 0.0]),
            (JointKind::LeftHand,      [-200.0, -400.0, 0.0]),
            (JointKind::RightShoulder, [200.0, 0.0, 0.0]),
            (JointKind::RightElbow,    [200.0, -200.0, 0.0]),
            (JointKind::RightHand,     [200.0, -400.0, 0.0]),
        ]);
        let events = ArmPose::from_snapshot(&s).events(Role::ALL[2], 1);
        let controllers: Vec<u8> = events.iter().map(|e| e.to_bytes()[1]).collect();
        assert_eq!(controllers, vec![1, 2, 3, 4, 5, 6]);
        assert!(events.iter().all(|e| e.channel() == 2));
    }

    #[test]
    fn degenerate_arm_drops_only_its_three_events() {
        let s = snap(&[
            (JointKind::RightShoulder, [200.0, 0.0, 0.0]),
            (JointKind::RightElbow,    [200.0, -200.0, 0.0]),
            (JointKind::RightHand,     [200.0, -400.0, 0.0]),
        ]);
        let mut sink: Vec<MidiEvent> = Vec::new();
        let sent = ArmPose::from_snapshot(&s).emit(Role::ALL[0], 1, &mut sink);
        assert_eq!(sent, 3);
        let controllers: Vec<u8> = sink.iter().map(|e| e.to_bytes()[1]).collect();
        assert_eq!(controllers, vec![4, 5, 6]);
    }
}
