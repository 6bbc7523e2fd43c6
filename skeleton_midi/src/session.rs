//! The mapping session: user slots, the shared focus, and the per-frame
//! entry points.
//!
//! # Preconditions
//!
//! [`Session::map_user`] must only be called for users whose skeleton is
//! fully resolved this frame (visible and tracked).  Joint confidence is
//! not re-checked here.  [`Session::map_frame`] applies that filter for
//! you.
//!
//! # Emission order
//!
//! Per user: the role-select event (if the user clapped this frame), then
//! the six arm controllers leftX, leftY, leftZ, rightX, rightY, rightZ on
//! the focused role's channel.  Within a frame users are mapped in
//! ascending id order, so when two users clap in the same frame the
//! higher id wins the focus.

use crate::clap::{detect_clap, ClapState, RoleSelect};
use crate::config::MappingConfig;
use crate::error::MappingError;
use crate::frame::SkeletonFrame;
use crate::joint::JointSource;
use crate::midi::MidiSink;
use crate::pose::ArmPose;
use crate::role::{FocusRole, Role};
use crate::snapshot::{TrackedUserSnapshot, UserSlots};

// ════════════════════════════════════════════════════════════════════════════
// UserReport — what happened for one user
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UserReport {
    pub user_id:     u16,
    /// Set on the frame this user's clap latched.
    pub role_select: Option<RoleSelect>,
    /// Role whose channel received the arm controllers.
    pub role:        Role,
    pub pose:        ArmPose,
    /// Number of events sent to the sink for this user.
    pub sent:        usize,
}

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

/// Owns all mapper state that survives between frames.
#[derive(Clone, Debug, Default)]
pub struct Session {
    config: MappingConfig,
    slots:  UserSlots,
    focus:  FocusRole,
}

impl Session {
    pub fn new(config: MappingConfig) -> Self {
        Session { config, ..Session::default() }
    }

    pub fn config(&self) -> &MappingConfig { &self.config }

    pub fn focus_role(&self) -> Role { self.focus.get() }

    /// Focus `role` directly (e.g. from a role list).  Returns the
    /// previously focused role.
    pub fn set_focus_role(&mut self, role: Role) -> Role {
        let prev = self.focus.set(role);
        if prev != role {
            log::info!("focus {} → {}", prev, role);
        }
        prev
    }

    pub fn snapshot(&self, user_id: u16) -> Result<&TrackedUserSnapshot, MappingError> {
        self.slots.get(user_id)
    }

    pub fn clap_state(&self, user_id: u16) -> Result<ClapState, MappingError> {
        Ok(self.slots.get(user_id)?.clap)
    }

    /// Map one fully tracked user for this frame.
    ///
    /// The only error is [`MappingError::MissingUserSlot`]; a degenerate
    /// arm is reported in the returned [`UserReport::pose`] and simply
    /// produces no events for that arm.
    pub fn map_user<J, S>(
        &mut self,
        user_id: u16,
        source:  &J,
        sink:    &mut S,
    ) -> Result<UserReport, MappingError>
    where
        J: JointSource + ?Sized,
        S: MidiSink + ?Sized,
    {
        let snapshot = self.slots.update(user_id, source)?;
        let mut sent = 0;

        let role_select = detect_clap(snapshot, &self.config);
        if let Some(sel) = role_select {
            sink.send(sel.event);
            sent += 1;
        }

        let pose = ArmPose::from_snapshot(snapshot);

        if let Some(sel) = role_select {
            self.set_focus_role(sel.role);
        }
        let role = self.focus.get();
        sent += pose.emit(role, self.config.pose_base_controller, sink);

        Ok(UserReport { user_id, role_select, role, pose, sent })
    }

    /// Map every fully tracked user of `frame`, lowest id first.
    ///
    /// Stops at the first user id without a slot.
    pub fn map_frame<S: MidiSink + ?Sized>(
        &mut self,
        frame: &SkeletonFrame,
        sink:  &mut S,
    ) -> Result<Vec<UserReport>, MappingError> {
        let mut users: Vec<_> = frame.tracked_users().collect();
        users.sort_by_key(|u| u.id);

        let mut reports = Vec::with_capacity(users.len());
        for user in users {
            reports.push(self.map_user(user.id, &user.skeleton, sink)?);
        }
        Ok(reports)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
