//! Joints as delivered by the body tracker.
//!
//! A [`Skeleton`] carries every joint the tracker reports (15 of them, in
//! the NiTE layout).  The mapper itself only reads the seven
//! [`TrackedJoint`]s through the [`JointSource`] trait, so anything that
//! can answer "where is the left hand" can drive it.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Joint
// ════════════════════════════════════════════════════════════════════════════

/// A skeletal landmark: position in sensor space (millimetres) and a
/// tracker confidence in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub position:   Vector3<f32>,
    #[serde(default)]
    pub confidence: f32,
}

impl Joint {
    pub fn new(position: Vector3<f32>, confidence: f32) -> Self {
        Joint { position, confidence: confidence.clamp(0.0, 1.0) }
    }

    /// A fully confident joint at `(x, y, z)`.
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Joint::new(Vector3::new(x, y, z), 1.0)
    }
}

impl Default for Joint {
    fn default() -> Self {
        Joint { position: Vector3::zeros(), confidence: 0.0 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// JointKind — the full tracker layout
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointKind {
    Head,
    Neck,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftHand,
    RightHand,
    Torso,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftFoot,
    RightFoot,
}

impl JointKind {
    pub const COUNT: usize = 15;

    pub const ALL: [JointKind; JointKind::COUNT] = [
        JointKind::Head,
        JointKind::Neck,
        JointKind::LeftShoulder,
        JointKind::RightShoulder,
        JointKind::LeftElbow,
        JointKind::RightElbow,
        JointKind::LeftHand,
        JointKind::RightHand,
        JointKind::Torso,
        JointKind::LeftHip,
        JointKind::RightHip,
        JointKind::LeftKnee,
        JointKind::RightKnee,
        JointKind::LeftFoot,
        JointKind::RightFoot,
    ];

    pub fn index(self) -> usize { self as usize }
}

// ════════════════════════════════════════════════════════════════════════════
// TrackedJoint — the subset the mapper reads
// ════════════════════════════════════════════════════════════════════════════

/// The seven joints cached per user for gesture and pose mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackedJoint {
    LeftHand,
    LeftElbow,
    LeftShoulder,
    RightHand,
    RightElbow,
    RightShoulder,
    Torso,
}

impl TrackedJoint {
    pub const COUNT: usize = 7;

    pub const ALL: [TrackedJoint; TrackedJoint::COUNT] = [
        TrackedJoint::LeftHand,
        TrackedJoint::LeftElbow,
        TrackedJoint::LeftShoulder,
        TrackedJoint::RightHand,
        TrackedJoint::RightElbow,
        TrackedJoint::RightShoulder,
        TrackedJoint::Torso,
    ];

    pub fn index(self) -> usize { self as usize }

    /// Where this joint lives in the full tracker layout.
    pub fn kind(self) -> JointKind {
        match self {
            TrackedJoint::LeftHand      => JointKind::LeftHand,
            TrackedJoint::LeftElbow     => JointKind::LeftElbow,
            TrackedJoint::LeftShoulder  => JointKind::LeftShoulder,
            TrackedJoint::RightHand     => JointKind::RightHand,
            TrackedJoint::RightElbow    => JointKind::RightElbow,
            TrackedJoint::RightShoulder => JointKind::RightShoulder,
            TrackedJoint::Torso         => JointKind::Torso,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// JointSource — what the mapper consumes
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can report the seven mapped joints of one user.
pub trait JointSource {
    fn joint(&self, joint: TrackedJoint) -> Joint;
}

// ════════════════════════════════════════════════════════════════════════════
// Skeleton
// ════════════════════════════════════════════════════════════════════════════

/// One user's full set of joints for a single frame.
///
/// Serialised as a map keyed by joint name; joints absent from the map
/// come back as zero-confidence joints at the origin.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<JointKind, Joint>", into = "BTreeMap<JointKind, Joint>")]
pub struct Skeleton {
    joints: [Joint; JointKind::COUNT],
}

impl Skeleton {
    pub fn get(&self, kind: JointKind) -> &Joint {
        &self.joints[kind.index()]
    }

    pub fn set(&mut self, kind: JointKind, joint: Joint) {
        self.joints[kind.index()] = joint;
    }

    /// Builder-style [`Skeleton::set`].
    pub fn with(mut self, kind: JointKind, joint: Joint) -> Self {
        self.set(kind, joint);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (JointKind, &Joint)> {
        JointKind::ALL.iter().map(move |&k| (k, &self.joints[k.index()]))
    }
}

impl JointSource for Skeleton {
    fn joint(&self, joint: TrackedJoint) -> Joint {
        *self.get(joint.kind())
    }
}

impl From<BTreeMap<JointKind, Joint>> for Skeleton {
    fn from(map: BTreeMap<JointKind, Joint>) -> Self {
        let mut skeleton = Skeleton::default();
        for (kind, joint) in map {
            skeleton.set(kind, joint);
        }
        skeleton
    }
}

impl From<Skeleton> for BTreeMap<JointKind, Joint> {
    fn from(skeleton: Skeleton) -> Self {
        skeleton.iter().map(|(k, j)| (k, *j)).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_joint_maps_into_full_layout() {
        let sk = Skeleton::default()
            .with(JointKind::LeftElbow, Joint::at(1.0, 2.0, 3.0))
            .with(JointKind::Head, Joint::at(9.0, 9.0, 9.0));
        assert_eq!(sk.joint(TrackedJoint::LeftElbow).position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(sk.joint(TrackedJoint::Torso), Joint::default());
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(Joint::new(Vector3::zeros(), 3.0).confidence, 1.0);
        assert_eq!(Joint::new(Vector3::zeros(), -1.0).confidence, 0.0);
    }

    #[test]
    fn skeleton_json_uses_joint_names() {
        let sk = Skeleton::default().with(JointKind::RightHand, Joint::at(10.0, 20.0, 30.0));
        let json = serde_json::to_string(&sk).unwrap();
        assert!(json.contains("\"right_hand\""));
        let back: Skeleton = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sk);
    }

    #[test]
    fn missing_joints_default_to_untracked() {
        let sk: Skeleton = serde_json::from_str(
            r#"{"torso":{"position":[0.0,100.0,2000.0],"confidence":1.0}}"#,
        ).unwrap();
        assert_eq!(sk.get(JointKind::Torso).position.y, 100.0);
        assert_eq!(sk.get(JointKind::Head).confidence, 0.0);
    }
}
