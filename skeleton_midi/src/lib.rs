//! # skeleton_midi
//!
//! Turn body-tracker skeletons into MIDI control messages for up to four
//! people at once.
//!
//! * **Clap** (hands closer than 100 mm) → selects one of four *roles*
//!   by where the hands meet relative to the shoulders, and sends a
//!   role-select controller on channel 4.
//! * **Arm pose** → each hand's position relative to its shoulder,
//!   scaled by arm length, becomes controllers 1–6 on the focused role's
//!   channel, every frame.
//!
//! The crate does no I/O: joints come in through [`JointSource`] (or a
//! whole [`SkeletonFrame`]) and events leave through a [`MidiSink`].
//!
//! ## Quick start
//!
//! ```rust
//! use skeleton_midi::{Joint, JointKind, MidiEvent, Session, Skeleton};
//!
//! let body = Skeleton::default()
//!     .with(JointKind::LeftShoulder,  Joint::at(-50.0, 0.0, 0.0))
//!     .with(JointKind::RightShoulder, Joint::at( 50.0, 0.0, 0.0))
//!     .with(JointKind::LeftElbow,     Joint::at(-60.0, 30.0, 0.0))
//!     .with(JointKind::RightElbow,    Joint::at( 60.0, 30.0, 0.0))
//!     .with(JointKind::LeftHand,      Joint::at(-10.0, 60.0, 0.0))
//!     .with(JointKind::RightHand,     Joint::at( 10.0, 60.0, 0.0));
//!
//! let mut session = Session::default();
//! let mut events: Vec<MidiEvent> = Vec::new();
//! session.map_user(1, &body, &mut events).unwrap();
//!
//! // Hands met above the shoulders' midpoint, on the x ≤ 0 side: role 0.
//! assert_eq!(events[0], MidiEvent::control_change(4, 80, 127));
//! assert_eq!(events.len(), 7);
//! ```

pub mod joint;
pub mod snapshot;
pub mod role;
pub mod clap;
pub mod pose;
pub mod midi;
pub mod config;
pub mod frame;
pub mod session;
pub mod error;

pub use clap::{ClapState, ClapTransition, Quadrant, RoleSelect};
pub use config::MappingConfig;
pub use error::{ConfigError, MappingError, RecordingError};
pub use frame::{read_recording, write_frame, SkeletonFrame, SkeletonState, TrackedUser, UserState};
pub use joint::{Joint, JointKind, JointSource, Skeleton, TrackedJoint};
pub use midi::{MidiEvent, MidiSink};
pub use pose::{Arm, ArmPose, ArmValues};
pub use role::{FocusRole, Role, ROLE_COUNT};
pub use session::{Session, UserReport};
pub use snapshot::{TrackedUserSnapshot, UserSlots, USER_SLOTS};
