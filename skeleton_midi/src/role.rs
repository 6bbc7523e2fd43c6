//! Roles and the shared focus.
//!
//! There are four roles, and exactly one of them is focused at a time.
//! The focus is session-wide rather than per user: whoever clapped last
//! decides which channel the arm controllers go to.

use std::fmt;

/// Number of selectable roles.
pub const ROLE_COUNT: usize = 4;

// ════════════════════════════════════════════════════════════════════════════
// Role
// ════════════════════════════════════════════════════════════════════════════

/// One of the four output roles.  The role index doubles as the MIDI
/// channel that receives its arm-pose controllers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Role(u8);

impl Role {
    pub const ALL: [Role; ROLE_COUNT] = [Role(0), Role(1), Role(2), Role(3)];

    /// `None` unless `index < 4`.
    pub fn new(index: usize) -> Option<Role> {
        if index < ROLE_COUNT { Some(Role(index as u8)) } else { None }
    }

    pub fn index(self) -> usize { self.0 as usize }

    /// Channel carrying this role's controllers.
    pub fn channel(self) -> u8 { self.0 }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "role {}", self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FocusRole — session-wide context
// ════════════════════════════════════════════════════════════════════════════

/// The currently focused role.  Starts at role 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FocusRole {
    role: Role,
}

impl FocusRole {
    pub fn get(&self) -> Role { self.role }

    /// Focus `role`; returns the previously focused role.
    pub fn set(&mut self, role: Role) -> Role {
        std::mem::replace(&mut self.role, role)
    }
}
