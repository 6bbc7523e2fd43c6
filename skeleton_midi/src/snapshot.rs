//! Per-user joint cache.
//!
//! The store has exactly four slots, one per sensor user id 1–4.  A slot
//! is refreshed whenever its user is mapped and is otherwise left alone:
//! users who walk out of view keep their last snapshot, which simply
//! stops being read.

use nalgebra::Vector3;

use crate::clap::ClapState;
use crate::error::MappingError;
use crate::joint::{JointSource, TrackedJoint};

/// Number of users the store can hold.
pub const USER_SLOTS: usize = 4;

// ════════════════════════════════════════════════════════════════════════════
// TrackedUserSnapshot
// ════════════════════════════════════════════════════════════════════════════

/// Cached joint positions and gesture latch for one user slot.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedUserSnapshot {
    positions: [Vector3<f32>; TrackedJoint::COUNT],
    pub clap:  ClapState,
}

impl Default for TrackedUserSnapshot {
    fn default() -> Self {
        TrackedUserSnapshot {
            positions: [Vector3::zeros(); TrackedJoint::COUNT],
            clap:      ClapState::Open,
        }
    }
}

impl TrackedUserSnapshot {
    pub fn position(&self, joint: TrackedJoint) -> Vector3<f32> {
        self.positions[joint.index()]
    }

    /// Copy the seven mapped joint positions out of `source`.
    ///
    /// Confidence is not consulted; callers only hand over skeletons that
    /// are already fully tracked.  The clap latch is untouched.
    pub fn update<S: JointSource + ?Sized>(&mut self, source: &S) {
        for joint in TrackedJoint::ALL {
            self.positions[joint.index()] = source.joint(joint).position;
        }
    }

    /// Distance between the two hands.
    pub fn hands_distance(&self) -> f32 {
        (self.position(TrackedJoint::LeftHand) - self.position(TrackedJoint::RightHand)).norm()
    }

    /// Hands' midpoint relative to the shoulders' midpoint.
    pub fn hands_offset(&self) -> Vector3<f32> {
        (self.position(TrackedJoint::LeftHand) + self.position(TrackedJoint::RightHand)
            - self.position(TrackedJoint::LeftShoulder)
            - self.position(TrackedJoint::RightShoulder))
            / 2.0
    }
}

// ════════════════════════════════════════════════════════════════════════════
// UserSlots — fixed arena indexed by user id
// ════════════════════════════════════════════════════════════════════════════

/// Four pre-allocated snapshots, indexed by sensor user id minus one.
#[derive(Clone, Debug, Default)]
pub struct UserSlots {
    slots: [TrackedUserSnapshot; USER_SLOTS],
}

impl UserSlots {
    pub fn new() -> Self { Self::default() }

    /// Slot index for a sensor-assigned user id (ids start at 1).
    pub fn slot_index(user_id: u16) -> Result<usize, MappingError> {
        match user_id {
            1..=4 => Ok(user_id as usize - 1),
            _     => Err(MappingError::MissingUserSlot { user_id, slots: USER_SLOTS }),
        }
    }

    pub fn get(&self, user_id: u16) -> Result<&TrackedUserSnapshot, MappingError> {
        Ok(&self.slots[Self::slot_index(user_id)?])
    }

    pub fn get_mut(&mut self, user_id: u16) -> Result<&mut TrackedUserSnapshot, MappingError> {
        Ok(&mut self.slots[Self::slot_index(user_id)?])
    }

    /// Refresh the slot for `user_id` from `source`.
    pub fn update<S: JointSource + ?Sized>(
        &mut self,
        user_id: u16,
        source:  &S,
    ) -> Result<&mut TrackedUserSnapshot, MappingError> {
        let slot = self.get_mut(user_id)?;
        slot.update(source);
        Ok(slot)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::{Joint, JointKind, Skeleton};

    fn hands(l: (f32, f32, f32), r: (f32, f32, f32)) -> Skeleton {
        Skeleton::default()
            .with(JointKind::LeftHand,  Joint::at(l.0, l.1, l.2))
            .with(JointKind::RightHand, Joint::at(r.0, r.1, r.2))
    }

    #[test]
    fn user_ids_one_to_four_have_slots() {
        assert_eq!(UserSlots::slot_index(1), Ok(0));
        assert_eq!(UserSlots::slot_index(4), Ok(3));
    }

    #[test]
    fn user_ids_outside_range_are_rejected() {
        for id in [0u16, 5, 100] {
            assert!(matches!(
                UserSlots::slot_index(id),
                Err(MappingError::MissingUserSlot { user_id, .. }) if user_id == id
            ));
        }
    }

    #[test]
    fn update_copies_positions_and_keeps_latch() {
        let mut slots = UserSlots::new();
        slots.get_mut(2).unwrap().clap = ClapState::Clapped;
        slots.update(2, &hands((1.0, 2.0, 3.0), (4.0, 5.0, 6.0))).unwrap();

        let snap = slots.get(2).unwrap();
        assert_eq!(snap.position(TrackedJoint::LeftHand), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(snap.position(TrackedJoint::RightHand), Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(snap.clap, ClapState::Clapped);
    }

    #[test]
    fn other_slots_are_untouched() {
        let mut slots = UserSlots::new();
        slots.update(1, &hands((1.0, 1.0, 1.0), (2.0, 2.0, 2.0))).unwrap();
        assert_eq!(slots.get(3).unwrap(), &TrackedUserSnapshot::default());
    }

    #[test]
    fn hands_distance_is_euclidean() {
        let mut snap = TrackedUserSnapshot::default();
        snap.update(&hands((0.0, 0.0, 0.0), (30.0, 40.0, 0.0)));
        assert!((snap.hands_distance() - 50.0).abs() < 1e-4);
    }
}
